//! One handler per operation kind.
//!
//! Every handler validates its payload, then runs the shared lifecycle:
//! before-event, cancel check, effect, after-event. The after-event fires
//! even when the effect fails so observers always see both halves.

use crate::batch::Descriptor;
use crate::config::EngineConfig;
use crate::env::{ConsoleLevel, Environment, Permission, PendingNotification, StorageKind};
use crate::error::OperationError;
use crate::events::{Event, EventBus};
use crate::hooks::HookRegistry;
use crate::kind::OperationKind;
use crate::reconcile::{self, FocusSnapshot, Ordinal};
use html::{AdjacentPosition, Document, NodeId, PropValue};
use morph::MergeEngine;
use serde_json::{Map, Value};

/// Disjoint borrows of the engine handed to each handler.
pub(crate) struct Ctx<'e> {
    pub(crate) doc: &'e mut Document,
    pub(crate) events: &'e mut EventBus,
    pub(crate) hooks: &'e mut HookRegistry,
    pub(crate) env: &'e mut dyn Environment,
    pub(crate) merge: &'e dyn MergeEngine,
    pub(crate) config: &'e EngineConfig,
}

impl Ctx<'_> {
    fn emit(&mut self, name: &str, target: NodeId, descriptor: &mut Descriptor) {
        let mut event = Event::operation(name, target, self.doc, descriptor);
        self.events.dispatch(&mut event);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    Applied,
    Canceled,
}

/// Runs one operation instance. `element` is `None` only when nothing
/// matched and missing-element warnings are on.
pub(crate) fn execute(
    ctx: &mut Ctx<'_>,
    kind: OperationKind,
    d: &mut Descriptor,
    element: Option<NodeId>,
) -> Result<Outcome, OperationError> {
    let target = match element {
        Some(node) => node,
        None if kind.is_global() => ctx.doc.root(),
        None => return Err(OperationError::MissingElement),
    };
    use OperationKind as K;
    match kind {
        K::InnerHtml => {
            let html = d.require_text(kind, "html")?;
            run(ctx, kind, d, target, |ctx, _| Ok(ctx.doc.set_inner_html(target, &html)?))
        }
        K::OuterHtml => {
            let html = d.require_text(kind, "html")?;
            run(ctx, kind, d, target, |ctx, _| {
                require_element(ctx.doc, kind, target)?;
                Ok(ctx.doc.set_outer_html(target, &html)?)
            })
        }
        K::Append | K::Prepend => {
            let html = d.require_text(kind, "html")?;
            let position = if kind == K::Append {
                AdjacentPosition::BeforeEnd
            } else {
                AdjacentPosition::AfterBegin
            };
            run(ctx, kind, d, target, |ctx, _| {
                Ok(ctx.doc.insert_adjacent_html(target, position, &html)?)
            })
        }
        K::InsertAdjacentHtml => {
            let html = d.require_text(kind, "html")?;
            let position = position(d, kind)?;
            run(ctx, kind, d, target, |ctx, _| {
                Ok(ctx.doc.insert_adjacent_html(target, position, &html)?)
            })
        }
        K::InsertAdjacentText => {
            let text = d.require_text(kind, "text")?;
            let position = position(d, kind)?;
            run(ctx, kind, d, target, |ctx, _| {
                Ok(ctx.doc.insert_adjacent_text(target, position, &text)?)
            })
        }
        K::TextContent => {
            let text = d.require_text(kind, "text")?;
            run(ctx, kind, d, target, |ctx, _| Ok(ctx.doc.set_text_content(target, &text)?))
        }
        K::Replace => {
            let html = d.require_text(kind, "html")?;
            run(ctx, kind, d, target, |ctx, _| {
                require_element(ctx.doc, kind, target)?;
                let fragment = ctx.doc.parse_fragment(&html);
                Ok(ctx.doc.replace_with(target, fragment)?)
            })
        }
        K::Morph => {
            let html = d.require_text(kind, "html")?;
            d.content = Some(ctx.doc.parse_fragment(html.trim()));
            run(ctx, kind, d, target, |ctx, d| reconcile::merge_fragment(ctx, d, target))
        }
        K::Remove => run(ctx, kind, d, target, |ctx, _| {
            require_element(ctx.doc, kind, target)?;
            Ok(ctx.doc.remove(target)?)
        }),
        K::SetAttribute => {
            let name = d.require_text(kind, "name")?;
            let value = d.require_text(kind, "value")?;
            run(ctx, kind, d, target, |ctx, _| {
                require_element(ctx.doc, kind, target)?;
                Ok(ctx.doc.set_attribute(target, &name, &value)?)
            })
        }
        K::RemoveAttribute => {
            let name = d.require_text(kind, "name")?;
            run(ctx, kind, d, target, |ctx, _| {
                require_element(ctx.doc, kind, target)?;
                Ok(ctx.doc.remove_attribute(target, &name)?)
            })
        }
        K::AddCssClass | K::RemoveCssClass => {
            let names = class_names(d, kind)?;
            run(ctx, kind, d, target, |ctx, _| {
                require_element(ctx.doc, kind, target)?;
                let names = names.iter().map(String::as_str);
                if kind == K::AddCssClass {
                    ctx.doc.add_classes(target, names)?;
                } else {
                    ctx.doc.remove_classes(target, names)?;
                }
                Ok(())
            })
        }
        K::SetStyle => {
            let name = d.require_text(kind, "name")?;
            let value = d.require_text(kind, "value")?;
            run(ctx, kind, d, target, |ctx, _| {
                require_element(ctx.doc, kind, target)?;
                Ok(css::set_style_property(ctx.doc, target, &name, &value)?)
            })
        }
        K::SetStyles => {
            let styles = styles(d, kind)?;
            run(ctx, kind, d, target, |ctx, _| {
                require_element(ctx.doc, kind, target)?;
                for (name, value) in &styles {
                    css::set_style_property(ctx.doc, target, name, value)?;
                }
                Ok(())
            })
        }
        K::SetDatasetProperty => {
            let name = d.require_text(kind, "name")?;
            let value = d.require_text(kind, "value")?;
            run(ctx, kind, d, target, |ctx, _| {
                require_element(ctx.doc, kind, target)?;
                Ok(ctx.doc.set_dataset(target, &name, &value)?)
            })
        }
        K::SetProperty => {
            let name = d.require_text(kind, "name")?;
            let value = property_value(d, kind)?;
            run(ctx, kind, d, target, |ctx, _| {
                require_element(ctx.doc, kind, target)?;
                if !ctx.doc.set_property(target, &name, value)? {
                    log::debug!(target: "ops.catalog", "setProperty: {name:?} is not a property of {target:?}");
                }
                Ok(())
            })
        }
        K::SetValue => {
            let value = d.require_text(kind, "value")?;
            run(ctx, kind, d, target, |ctx, _| {
                require_element(ctx.doc, kind, target)?;
                if !ctx.doc.set_property(target, "value", PropValue::Text(value))? {
                    log::debug!(target: "ops.catalog", "setValue: {target:?} has no value");
                }
                Ok(())
            })
        }
        K::DispatchEvent => {
            let name = d.require_text(kind, "name")?;
            let detail = d.field("detail").cloned().unwrap_or(Value::Null);
            run(ctx, kind, d, target, |ctx, _| {
                let mut event = Event::custom(&name, target, ctx.doc, &detail);
                ctx.events.dispatch(&mut event);
                Ok(())
            })
        }
        K::ClearStorage => {
            let storage = StorageKind::from_type(d.text("type").as_deref());
            run(ctx, kind, d, target, |ctx, _| {
                ctx.env.storage(storage).clear();
                Ok(())
            })
        }
        K::SetStorageItem => {
            let key = d.require_text(kind, "key")?;
            let value = d.require_text(kind, "value")?;
            let storage = StorageKind::from_type(d.text("type").as_deref());
            run(ctx, kind, d, target, |ctx, _| {
                ctx.env.storage(storage).set_item(&key, &value);
                Ok(())
            })
        }
        K::RemoveStorageItem => {
            let key = d.require_text(kind, "key")?;
            let storage = StorageKind::from_type(d.text("type").as_deref());
            run(ctx, kind, d, target, |ctx, _| {
                ctx.env.storage(storage).remove_item(&key);
                Ok(())
            })
        }
        K::PushState => {
            let state = d.field("state").cloned().unwrap_or(Value::Null);
            let title = d.text("title").unwrap_or_default();
            let url = d.text("url");
            run(ctx, kind, d, target, |ctx, _| {
                ctx.env.push_state(state, &title, url.as_deref());
                Ok(())
            })
        }
        K::SetCookie => {
            let cookie = d.require_text(kind, "cookie")?;
            run(ctx, kind, d, target, |ctx, _| {
                ctx.env.set_cookie(&cookie);
                Ok(())
            })
        }
        K::ConsoleLog => {
            let message = match d.field("message") {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            };
            let level = match d.text("level") {
                None => ConsoleLevel::Log,
                Some(name) => ConsoleLevel::from_name(&name)
                    .ok_or_else(|| invalid(kind, "level", &format!("`{name}` is not a console level")))?,
            };
            run(ctx, kind, d, target, |ctx, _| {
                ctx.env.console().log(level, &message);
                Ok(())
            })
        }
        K::Notification => {
            let pending = PendingNotification {
                title: d.text("title").unwrap_or_default(),
                options: d.field("options").cloned().unwrap_or(Value::Null),
            };
            run(ctx, kind, d, target, |ctx, d| {
                let notifications = ctx.env.notifications();
                // The after-event sees the permission as it stood before any
                // prompt is answered.
                let permission = notifications.permission();
                match permission {
                    Permission::Granted => notifications.show(pending),
                    Permission::Default => notifications.request_permission(pending),
                    Permission::Denied => {}
                }
                d.fields
                    .insert("permission".to_string(), Value::from(permission.as_str()));
                Ok(())
            })
        }
        K::SetFocus => run(ctx, kind, d, target, |ctx, _| {
            require_element(ctx.doc, kind, target)?;
            if !ctx.doc.focus(target) {
                log::debug!(target: "ops.catalog", "setFocus: {target:?} cannot take focus");
            }
            Ok(())
        }),
    }
}

fn run(
    ctx: &mut Ctx<'_>,
    kind: OperationKind,
    d: &mut Descriptor,
    target: NodeId,
    effect: impl FnOnce(&mut Ctx<'_>, &mut Descriptor) -> Result<(), OperationError>,
) -> Result<Outcome, OperationError> {
    d.element = Some(target);
    let ordinal = kind
        .may_replace_target()
        .then(|| Ordinal::capture(ctx.doc, target));
    let focus = kind
        .restores_focus()
        .then(|| FocusSnapshot::capture(ctx.doc));

    ctx.emit(&kind.before_event(), target, d);
    if d.is_canceled() {
        log::trace!(target: "ops.catalog", "{kind} on {target:?} canceled");
        ctx.emit(&kind.after_event(), target, d);
        return Ok(Outcome::Canceled);
    }

    let result = effect(ctx, d).and_then(|()| match focus {
        Some(focus) => Ok(focus.restore(ctx.doc, d.focus_selector.as_deref())?),
        None => Ok(()),
    });

    let after = match ordinal {
        _ if kind == OperationKind::Remove && result.is_ok() => ctx.doc.root(),
        Some(ordinal) => ordinal.resolve(ctx.doc, target),
        None => target,
    };
    d.element = Some(after);
    ctx.emit(&kind.after_event(), after, d);
    result.map(|()| Outcome::Applied)
}

fn require_element(doc: &Document, kind: OperationKind, node: NodeId) -> Result<(), OperationError> {
    if doc.is_element(node) {
        Ok(())
    } else {
        Err(OperationError::NotSupported {
            kind: kind.name(),
            target: "a non-element node",
        })
    }
}

fn position(d: &Descriptor, kind: OperationKind) -> Result<AdjacentPosition, OperationError> {
    match d.text("position") {
        None => Ok(AdjacentPosition::default()),
        Some(p) => p.parse().map_err(|_| OperationError::InvalidField {
            kind: kind.name(),
            field: "position",
            reason: format!("`{p}` is not an insertion position"),
        }),
    }
}

/// `name` as a string of space- or comma-separated classes, or an array of them.
fn class_names(d: &Descriptor, kind: OperationKind) -> Result<Vec<String>, OperationError> {
    let split = |s: &str| -> Vec<String> {
        s.split(|c: char| c == ',' || c.is_whitespace())
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect()
    };
    match d.field("name") {
        None => Err(OperationError::MissingField {
            kind: kind.name(),
            field: "name",
        }),
        Some(Value::String(s)) => Ok(split(s)),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(split(s)),
                _ => Err(invalid(kind, "name", "must hold only strings")),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|names| names.concat()),
        Some(_) => Err(invalid(kind, "name", "must be a string or an array of strings")),
    }
}

fn styles(d: &Descriptor, kind: OperationKind) -> Result<Vec<(String, String)>, OperationError> {
    let Some(Value::Object(map)) = d.field("styles") else {
        return Err(match d.field("styles") {
            None => OperationError::MissingField {
                kind: kind.name(),
                field: "styles",
            },
            Some(_) => invalid(kind, "styles", "must be an object"),
        });
    };
    style_pairs(map).ok_or_else(|| invalid(kind, "styles", "values must be strings or numbers"))
}

fn style_pairs(map: &Map<String, Value>) -> Option<Vec<(String, String)>> {
    map.iter()
        .map(|(name, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Null => String::new(),
                _ => return None,
            };
            Some((name.clone(), value))
        })
        .collect()
}

fn property_value(d: &Descriptor, kind: OperationKind) -> Result<PropValue, OperationError> {
    match d.fields.get("value") {
        None => Err(OperationError::MissingField {
            kind: kind.name(),
            field: "value",
        }),
        Some(Value::Null) => Ok(PropValue::Text(String::new())),
        Some(Value::Bool(b)) => Ok(PropValue::Bool(*b)),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(PropValue::Number)
            .ok_or_else(|| invalid(kind, "value", "is out of range")),
        Some(Value::String(s)) => Ok(PropValue::Text(s.clone())),
        Some(_) => Err(invalid(kind, "value", "must be a scalar")),
    }
}

fn invalid(kind: OperationKind, field: &'static str, reason: &str) -> OperationError {
    OperationError::InvalidField {
        kind: kind.name(),
        field,
        reason: reason.to_string(),
    }
}
