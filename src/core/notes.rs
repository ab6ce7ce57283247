use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseNotes {
    pub title: String,
    pub body: String,
}

/// Title is the annotation's first line; body is its first `body_lines` lines, verbatim.
pub fn from_annotation(annotation: &str, body_lines: usize) -> ReleaseNotes {
    let title = annotation.lines().next().unwrap_or("").to_string();
    let body = annotation
        .lines()
        .take(body_lines)
        .collect::<Vec<_>>()
        .join("\n");

    ReleaseNotes { title, body }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_and_first_three_lines() {
        let notes = from_annotation("1.3.0 Koopa\n\n- new level editor\n- fixed saves\n", 3);
        assert_eq!(notes.title, "1.3.0 Koopa");
        assert_eq!(notes.body, "1.3.0 Koopa\n\n- new level editor");
    }

    #[test]
    fn short_annotation_keeps_what_exists() {
        let notes = from_annotation("1.3.0", 3);
        assert_eq!(notes.title, "1.3.0");
        assert_eq!(notes.body, "1.3.0");
    }

    #[test]
    fn empty_annotation() {
        let notes = from_annotation("", 3);
        assert_eq!(notes.title, "");
        assert_eq!(notes.body, "");
    }
}
