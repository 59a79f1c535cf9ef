// Best-effort guess at whether a page is a login form

use pagescope_scanner::PageDocument;

/// What the page's `<input>` elements look like.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputShape {
    pub has_password: bool,
    pub has_email: bool,
    /// Any input whose type is not `text`, including password, email and
    /// inputs without a type attribute.
    pub has_other: bool,
}

impl InputShape {
    pub fn from_types<'a, I>(types: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut shape = InputShape::default();
        for input_type in types {
            match input_type {
                Some("password") => shape.has_password = true,
                Some("email") => shape.has_email = true,
                _ => {}
            }
            if input_type != Some("text") {
                shape.has_other = true;
            }
        }
        shape
    }

    pub fn from_document(document: &PageDocument) -> Self {
        Self::from_types(
            document
                .elements_named("input")
                .map(|input| input.value().attr("type")),
        )
    }

    /// Password field alongside some non-text field, and no email field.
    pub fn is_login_shaped(&self) -> bool {
        self.has_password && (self.has_email || self.has_other) && (self.has_other && !self.has_email)
    }
}

pub fn url_has_login_slug(page_url: &str, slugs: &[String]) -> bool {
    slugs.iter().any(|slug| page_url.contains(slug.as_str()))
}

pub fn looks_like_login(page_url: &str, shape: InputShape, slugs: &[String]) -> bool {
    url_has_login_slug(page_url, slugs) || shape.is_login_shaped()
}
