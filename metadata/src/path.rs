use std::collections::HashMap;

#[derive(Clone, Debug)]
enum Segment {
    Literal(String),
    Variable(String),
}

/// Parsed path template.
///
/// Supports literal segments (`/orders/pending`), `{name}` variable segments
/// (`/orders/{id}`), and a trailing `*` that accepts any remainder
/// (`/static/*`). Leading and trailing slashes are normalized away on both
/// the template and the matched path.
#[derive(Clone, Debug)]
pub struct PathPattern {
    segments: Vec<Segment>,
    trailing_splat: bool,
}

fn split_segments(path: &str) -> Vec<&str> {
    let normalized = path.trim().trim_matches('/');
    if normalized.is_empty() {
        Vec::new()
    } else {
        normalized.split('/').collect()
    }
}

impl PathPattern {
    pub fn parse(template: &str) -> Self {
        let mut normalized = template.trim().trim_matches('/');

        let mut trailing_splat = false;
        if let Some(stripped) = normalized.strip_suffix("/*") {
            trailing_splat = true;
            normalized = stripped;
        }

        let segments = split_segments(normalized)
            .into_iter()
            .map(|segment| {
                match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                    Some(name) => Segment::Variable(name.to_string()),
                    None => Segment::Literal(segment.to_string()),
                }
            })
            .collect();

        PathPattern {
            segments,
            trailing_splat,
        }
    }

    /// Matches a concrete request path against this template, yielding the
    /// captured variable values on success.
    pub fn matches<'a>(&self, path: &'a str) -> Option<HashMap<String, &'a str>> {
        let given = split_segments(path);

        if given.len() < self.segments.len() {
            return None;
        }
        if !self.trailing_splat && given.len() > self.segments.len() {
            return None;
        }

        let mut variables = HashMap::new();
        for (segment, value) in self.segments.iter().zip(given) {
            match segment {
                Segment::Literal(literal) if literal.as_str() == value => {}
                Segment::Literal(_) => return None,
                Segment::Variable(name) => {
                    variables.insert(name.clone(), value);
                }
            }
        }

        Some(variables)
    }
}
