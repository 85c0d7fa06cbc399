//! Logical key rendering

use std::borrow::Cow;

/// Renders logical keys into the namespaced form backends store them under.
///
/// Rendering is plain concatenation with no separator: prefix `"ab"` with key
/// `"c"` and prefix `"a"` with key `"bc"` both render to `"abc"`. Callers
/// pick prefixes that cannot overlap that way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyRenderer {
    prefix: Option<String>,
}

impl KeyRenderer {
    pub fn new(prefix: Option<String>) -> Self {
        Self {
            prefix: prefix.filter(|p| !p.is_empty()),
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Render `prefix + key`
    pub fn render<'a>(&self, key: &'a str) -> Cow<'a, str> {
        match &self.prefix {
            Some(prefix) => Cow::Owned(format!("{prefix}{key}")),
            None => Cow::Borrowed(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_without_prefix_borrows() {
        let renderer = KeyRenderer::new(None);
        assert!(matches!(renderer.render("foo"), Cow::Borrowed("foo")));
    }

    #[test]
    fn test_empty_prefix_is_no_prefix() {
        let renderer = KeyRenderer::new(Some(String::new()));
        assert_eq!(renderer.prefix(), None);
        assert_eq!(renderer.render("foo"), "foo");
    }

    #[test]
    fn test_render_concatenates() {
        let renderer = KeyRenderer::new(Some("app:".to_string()));
        assert_eq!(renderer.render("user"), "app:user");

        // Known ambiguity of separator-free rendering
        let a = KeyRenderer::new(Some("ab".to_string()));
        let b = KeyRenderer::new(Some("a".to_string()));
        assert_eq!(a.render("c"), b.render("bc"));
    }
}
