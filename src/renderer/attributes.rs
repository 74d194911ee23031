//! Attribute Reconciler - applies a prop delta to one live node.
//!
//! Walks the union of new and previous keys in order and, per changed key,
//! issues the narrowest mutation:
//!
//! | Key                | Mutation                                            |
//! |--------------------|-----------------------------------------------------|
//! | `key`, `ref`, `children` | none                                          |
//! | class keys         | `class` attribute, maps become their truthy keys    |
//! | style              | wholesale text, or per-property for map → map       |
//! | raw markup         | inner markup replaced, children left to the host    |
//! | event prefix       | old listener removed, new listener installed        |
//! | anything else      | property (if supported) and reflected attribute     |
//!
//! A missing key reads as `Null`, which is a removal.

use std::collections::BTreeSet;

use super::target::{LiveNode, LiveTarget};
use crate::pipeline::config::{config, Config};
use crate::types::{PropMap, PropValue};

const INERT_KEYS: &[&str] = &["key", "ref", "children"];

/// Reconcile `props` onto `node`. `previous` is `None` for a fresh node.
pub fn apply_props(
    target: &dyn LiveTarget,
    node: LiveNode,
    props: &PropMap,
    previous: Option<&PropMap>,
) {
    let config = config();
    let keys: BTreeSet<&String> = props
        .keys()
        .chain(previous.into_iter().flat_map(|p| p.keys()))
        .collect();

    for key in keys {
        let new = props.get(key.as_str()).unwrap_or(&PropValue::Null);
        let old = previous
            .and_then(|p| p.get(key.as_str()))
            .unwrap_or(&PropValue::Null);
        if new == old {
            continue;
        }
        apply_one(target, node, &config, key, new, old);
    }
}

fn apply_one(
    target: &dyn LiveTarget,
    node: LiveNode,
    config: &Config,
    key: &str,
    new: &PropValue,
    old: &PropValue,
) {
    if INERT_KEYS.contains(&key) {
        return;
    }

    if config.is_class_key(key) {
        apply_class(target, node, new);
    } else if key == config.style_key {
        apply_style(target, node, new, old);
    } else if key == config.raw_markup_key {
        let html = raw_markup(new).unwrap_or_default();
        target.set_inner_html(node, &html);
    } else if let Some(event) = config.event_name(key) {
        if let Some(handler) = old.as_handler() {
            target.remove_event_listener(node, &event, handler);
        }
        if let Some(handler) = new.as_handler() {
            target.add_event_listener(node, &event, handler.clone());
        }
    } else {
        apply_generic(target, node, key, new);
    }
}

// =============================================================================
// Class
// =============================================================================

/// Class string for a class prop value. `None` means remove the attribute.
pub fn class_string(value: &PropValue) -> Option<String> {
    if value.is_removal() {
        return None;
    }
    let class = match value {
        PropValue::Map(map) => map
            .iter()
            .filter(|(_, on)| on.is_truthy())
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(" "),
        PropValue::List(items) => items
            .iter()
            .filter_map(PropValue::as_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        other => other.as_text()?,
    };
    Some(class)
}

fn apply_class(target: &dyn LiveTarget, node: LiveNode, value: &PropValue) {
    match class_string(value) {
        Some(class) => target.set_attribute(node, "class", &class),
        None => target.remove_attribute(node, "class"),
    }
}

// =============================================================================
// Style
// =============================================================================

fn apply_style(target: &dyn LiveTarget, node: LiveNode, new: &PropValue, old: &PropValue) {
    match (new.as_map(), old.as_map()) {
        (Some(new_map), Some(old_map)) => {
            for name in old_map.keys().filter(|k| !new_map.contains_key(*k)) {
                target.remove_style_property(node, name);
            }
            set_style_map(target, node, new_map);
        }
        (Some(new_map), None) => {
            // Previous inline style was text (or absent): start from a clean slate.
            if !old.is_removal() {
                target.set_style_text(node, "");
            }
            set_style_map(target, node, new_map);
        }
        (None, _) => {
            let css = if new.is_removal() {
                String::new()
            } else {
                new.as_text().unwrap_or_default()
            };
            target.set_style_text(node, &css);
        }
    }
}

fn set_style_map(target: &dyn LiveTarget, node: LiveNode, map: &PropMap) {
    for (name, value) in map {
        match value.as_text() {
            Some(text) if !value.is_removal() => target.set_style_property(node, name, &text),
            _ => target.remove_style_property(node, name),
        }
    }
}

// =============================================================================
// Raw Markup
// =============================================================================

/// Markup carried by a raw-markup prop: a string, or a map with `__html`.
pub fn raw_markup(value: &PropValue) -> Option<String> {
    match value {
        PropValue::Str(s) => Some(s.to_string()),
        PropValue::Map(map) => map.get("__html").and_then(PropValue::as_text),
        _ => None,
    }
}

// =============================================================================
// Generic Keys
// =============================================================================

fn apply_generic(target: &dyn LiveTarget, node: LiveNode, key: &str, value: &PropValue) {
    let property = target.supports_property(node, key);

    if value.is_removal() {
        target.remove_attribute(node, key);
        if property {
            target.set_property(node, key, None);
        }
        return;
    }

    let Some(text) = value.as_text() else {
        tracing::debug!(key, "structured value has no attribute form, skipped");
        return;
    };
    if property {
        target.set_property(node, key, Some(&text));
    }
    target.set_attribute(node, key, &text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props;
    use crate::renderer::memory::{MemoryDom, Mutation};
    use crate::types::EventHandler;

    fn node(dom: &MemoryDom, tag: &str) -> LiveNode {
        let n = dom.create_element(tag);
        dom.take_mutations();
        n
    }

    #[test]
    fn test_class_from_map() {
        let dom = MemoryDom::new();
        let el = node(&dom, "div");
        let classes = props! { "a" => true, "b" => false, "c" => 1 };
        apply_props(&*dom, el, &props! { "className" => classes }, None);
        assert_eq!(dom.attribute(el, "class").as_deref(), Some("a c"));
    }

    #[test]
    fn test_class_removed() {
        let dom = MemoryDom::new();
        let el = node(&dom, "div");
        let before = props! { "class" => "msg" };
        apply_props(&*dom, el, &before, None);
        apply_props(&*dom, el, &props! {}, Some(&before));
        assert_eq!(dom.attribute(el, "class"), None);
    }

    #[test]
    fn test_style_map_to_empty_clears_property() {
        let dom = MemoryDom::new();
        let el = node(&dom, "p");
        let before = props! { "style" => props! { "color" => "red" } };
        apply_props(&*dom, el, &before, None);
        assert_eq!(dom.style(el, "color").as_deref(), Some("red"));

        let after = props! { "style" => props! {} };
        apply_props(&*dom, el, &after, Some(&before));
        assert_eq!(dom.style(el, "color"), None);
    }

    #[test]
    fn test_style_string_replaces_wholesale() {
        let dom = MemoryDom::new();
        let el = node(&dom, "p");
        let before = props! { "style" => props! { "color" => "red", "margin" => "0" } };
        apply_props(&*dom, el, &before, None);

        let after = props! { "style" => "padding: 1px" };
        apply_props(&*dom, el, &after, Some(&before));
        assert_eq!(dom.style_text(el), "padding: 1px");

        let again = props! { "style" => props! { "color" => "blue" } };
        apply_props(&*dom, el, &again, Some(&after));
        assert_eq!(dom.style_text(el), "color: blue");
    }

    #[test]
    fn test_unchanged_keys_issue_nothing() {
        let dom = MemoryDom::new();
        let el = node(&dom, "a");
        let props = props! { "href" => "/x", "key" => "k" };
        apply_props(&*dom, el, &props, None);
        dom.take_mutations();
        apply_props(&*dom, el, &props.clone(), Some(&props));
        assert!(dom.take_mutations().is_empty());
    }

    #[test]
    fn test_generic_property_and_attribute() {
        let dom = MemoryDom::new();
        let el = node(&dom, "input");
        apply_props(&*dom, el, &props! { "value" => "x", "data-id" => 7 }, None);
        assert_eq!(dom.property(el, "value").as_deref(), Some("x"));
        assert_eq!(dom.attribute(el, "value").as_deref(), Some("x"));
        assert_eq!(dom.attribute(el, "data-id").as_deref(), Some("7"));
        // Unsupported property names never reach set_property.
        assert!(!dom
            .take_mutations()
            .iter()
            .any(|m| matches!(m, Mutation::SetProperty(_, name, _) if name == "data-id")));
    }

    #[test]
    fn test_generic_removal() {
        let dom = MemoryDom::new();
        let el = node(&dom, "input");
        let before = props! { "disabled" => true, "title" => "t" };
        apply_props(&*dom, el, &before, None);
        let after = props! { "disabled" => false };
        apply_props(&*dom, el, &after, Some(&before));
        assert_eq!(dom.attribute(el, "disabled"), None);
        assert_eq!(dom.attribute(el, "title"), None);
        assert_eq!(dom.property(el, "title"), None);
    }

    #[test]
    fn test_event_handlers_replace() {
        let dom = MemoryDom::new();
        let el = node(&dom, "button");
        let first = props! { "onClick" => EventHandler::new(|_| {}) };
        apply_props(&*dom, el, &first, None);
        assert_eq!(dom.listener_count(el, "click"), 1);

        let second = props! { "onClick" => EventHandler::new(|_| {}) };
        apply_props(&*dom, el, &second, Some(&first));
        assert_eq!(dom.listener_count(el, "click"), 1);

        apply_props(&*dom, el, &props! {}, Some(&second));
        assert_eq!(dom.listener_count(el, "click"), 0);
    }

    #[test]
    fn test_raw_markup() {
        let dom = MemoryDom::new();
        let el = node(&dom, "div");
        let raw = props! { "dangerouslySetInnerHTML" => props! { "__html" => "<b>x</b>" } };
        apply_props(&*dom, el, &raw, None);
        assert_eq!(dom.inner_html(el).as_deref(), Some("<b>x</b>"));

        apply_props(&*dom, el, &props! {}, Some(&raw));
        assert_eq!(dom.inner_html(el).as_deref(), Some(""));
    }
}
