//! Per-body gravity compensation

use crate::constants::FULL_GRAVITY_COMPENSATION;
use crate::document::{AttrValue, ModelDocument, Tag};

/// Cancel gravity on every body, attached sub-trees included
pub fn compensate_gravity(document: &mut ModelDocument) -> usize {
    set_gravity_compensation(document, FULL_GRAVITY_COMPENSATION)
}

/// Set `gravcomp` on every body; returns the number of bodies touched
pub fn set_gravity_compensation(document: &mut ModelDocument, amount: f64) -> usize {
    let bodies: Vec<_> = document
        .descendants(document.root())
        .filter(|id| document.tag(*id).is_ok_and(|tag| tag == Tag::Body))
        .collect();
    for &body in &bodies {
        document.write_attr(body, "gravcomp", AttrValue::Float(amount));
    }
    tracing::debug!(
        "Set gravcomp={} on {} bodies of '{}'",
        amount,
        bodies.len(),
        document.model()
    );
    bodies.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Namespace;
    use crate::locator::FindOptions;

    fn arm() -> ModelDocument {
        let mut doc = ModelDocument::new("arm");
        let base = doc.add_named(doc.worldbody(), Tag::Body, "base").unwrap();
        doc.add_named(base, Tag::Body, "link").unwrap();
        doc.add_named(base, Tag::Site, "attachment_site").unwrap();
        doc
    }

    #[test]
    fn test_every_body_compensated() {
        let mut doc = arm();
        assert_eq!(compensate_gravity(&mut doc), 2);
        for body in doc.find_all(Namespace::Body, FindOptions::default()).unwrap() {
            assert_eq!(doc.attr_f64(body, "gravcomp").unwrap(), Some(1.0));
        }
    }

    #[test]
    fn test_idempotent() {
        let mut doc = arm();
        compensate_gravity(&mut doc);
        let once = doc.to_bytes().unwrap();
        compensate_gravity(&mut doc);
        assert_eq!(doc.to_bytes().unwrap(), once);
    }

    #[test]
    fn test_no_bodies_is_noop() {
        let mut doc = ModelDocument::new("empty");
        let before = doc.to_bytes().unwrap();
        assert_eq!(compensate_gravity(&mut doc), 0);
        assert_eq!(doc.to_bytes().unwrap(), before);
    }

    #[test]
    fn test_partial_compensation_overwrites() {
        let mut doc = arm();
        compensate_gravity(&mut doc);
        set_gravity_compensation(&mut doc, 0.5);
        let base = doc.find_one(Namespace::Body, "base").unwrap();
        assert_eq!(doc.attr_f64(base, "gravcomp").unwrap(), Some(0.5));
    }

    #[test]
    fn test_attached_bodies_included() {
        let mut hand = ModelDocument::new("hand");
        hand.add_named(hand.worldbody(), Tag::Body, "palm").unwrap();
        let mut doc = arm();
        let site = doc.find_one(Namespace::Site, "attachment_site").unwrap();
        doc.graft(site, hand);

        assert_eq!(compensate_gravity(&mut doc), 3);
        let palm = doc.find_one(Namespace::Body, "hand/palm").unwrap();
        assert_eq!(doc.attr_f64(palm, "gravcomp").unwrap(), Some(1.0));
    }
}
