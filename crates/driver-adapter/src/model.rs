//! Data shapes exchanged across the driver boundary.

use serde::{Deserialize, Serialize};

/// Roles that mark an element as part of a modal/overlay surface.
pub const OVERLAY_ROLES: &[&str] = &["dialog", "alertdialog"];

/// Axis-aligned bounding box in CSS pixels, viewport coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Center point of the box, the default pointer target.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// One interactive element as seen by the extractor.
///
/// Descriptors are recomputed on every loop iteration and referenced by
/// value only; the selector is a locator hint, never a persisted identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementDescriptor {
    /// Stable-ish CSS selector for the element.
    pub selector: String,

    /// Lowercased tag name.
    pub tag: String,

    /// ARIA role if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Visible text content, trimmed. May be empty.
    #[serde(default)]
    pub text: String,

    /// Viewport bounding box at extraction time.
    pub bounds: BoundingBox,

    /// Whether the element was visible when extracted.
    pub visible: bool,

    /// Input type for form fields (e.g. "text", "email"), if applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_kind: Option<String>,
}

impl ElementDescriptor {
    /// Effective role used for matching: explicit ARIA role, else the tag.
    pub fn effective_role(&self) -> &str {
        self.role.as_deref().unwrap_or(&self.tag)
    }

    /// Whether this descriptor represents a modal/overlay container.
    pub fn is_overlay(&self) -> bool {
        self.role
            .as_deref()
            .map(|r| OVERLAY_ROLES.contains(&r))
            .unwrap_or(false)
    }

    /// Whether this descriptor represents a form container.
    pub fn is_form(&self) -> bool {
        self.tag == "form" || self.role.as_deref() == Some("form")
    }
}

/// Event kinds for direct dispatch, bypassing pointer interception checks.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Click,
    Focus,
    Input,
}

/// Encoded screenshot returned by the driver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Screenshot {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl Screenshot {
    pub fn png(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            format: ImageFormat::Png,
        }
    }

    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            format: ImageFormat::Jpeg,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button(selector: &str, text: &str) -> ElementDescriptor {
        ElementDescriptor {
            selector: selector.to_string(),
            tag: "button".to_string(),
            role: None,
            text: text.to_string(),
            bounds: BoundingBox::new(10.0, 20.0, 100.0, 30.0),
            visible: true,
            field_kind: None,
        }
    }

    #[test]
    fn test_bounding_box_center() {
        let b = BoundingBox::new(10.0, 20.0, 100.0, 30.0);
        assert_eq!(b.center(), (60.0, 35.0));
        assert!(!b.is_empty());
        assert!(BoundingBox::default().is_empty());
    }

    #[test]
    fn test_effective_role_falls_back_to_tag() {
        let mut el = button("#submit", "Submit");
        assert_eq!(el.effective_role(), "button");
        el.role = Some("menuitem".to_string());
        assert_eq!(el.effective_role(), "menuitem");
    }

    #[test]
    fn test_overlay_and_form_detection() {
        let mut el = button("#x", "");
        assert!(!el.is_overlay());
        el.role = Some("dialog".to_string());
        assert!(el.is_overlay());

        let form = ElementDescriptor {
            selector: "form#login".to_string(),
            tag: "form".to_string(),
            role: None,
            text: String::new(),
            bounds: BoundingBox::default(),
            visible: true,
            field_kind: None,
        };
        assert!(form.is_form());
    }
}
