use std::fmt;
use std::str::FromStr;
use thiserror::Error;

macro_rules! operation_kinds {
    ($($variant:ident => $name:literal,)+) => {
        /// Every operation the engine knows, keyed on the wire by its camelCase name.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum OperationKind {
            $($variant,)+
        }

        impl OperationKind {
            pub const ALL: &'static [OperationKind] = &[$(OperationKind::$variant,)+];

            pub fn name(self) -> &'static str {
                match self {
                    $(OperationKind::$variant => $name,)+
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(OperationKind::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

operation_kinds! {
    InnerHtml => "innerHtml",
    OuterHtml => "outerHtml",
    Append => "append",
    Prepend => "prepend",
    InsertAdjacentHtml => "insertAdjacentHtml",
    InsertAdjacentText => "insertAdjacentText",
    TextContent => "textContent",
    Replace => "replace",
    Morph => "morph",
    Remove => "remove",
    SetAttribute => "setAttribute",
    RemoveAttribute => "removeAttribute",
    AddCssClass => "addCssClass",
    RemoveCssClass => "removeCssClass",
    SetStyle => "setStyle",
    SetStyles => "setStyles",
    SetDatasetProperty => "setDatasetProperty",
    SetProperty => "setProperty",
    SetValue => "setValue",
    DispatchEvent => "dispatchEvent",
    ClearStorage => "clearStorage",
    SetStorageItem => "setStorageItem",
    RemoveStorageItem => "removeStorageItem",
    PushState => "pushState",
    SetCookie => "setCookie",
    ConsoleLog => "consoleLog",
    Notification => "notification",
    SetFocus => "setFocus",
}

impl OperationKind {
    pub fn before_event(self) -> String {
        format!("before-{}", self.name())
    }

    pub fn after_event(self) -> String {
        format!("after-{}", self.name())
    }

    /// Kinds whose effect may swap out the target node, so the after-event
    /// is aimed at whatever sits at the target's old position.
    pub fn may_replace_target(self) -> bool {
        matches!(
            self,
            OperationKind::OuterHtml | OperationKind::Replace | OperationKind::Morph
        )
    }

    /// Kinds that act on window-level state and run without a target element.
    pub fn is_global(self) -> bool {
        matches!(
            self,
            OperationKind::ClearStorage
                | OperationKind::SetStorageItem
                | OperationKind::RemoveStorageItem
                | OperationKind::PushState
                | OperationKind::SetCookie
                | OperationKind::ConsoleLog
                | OperationKind::Notification
        )
    }

    pub fn restores_focus(self) -> bool {
        matches!(
            self,
            OperationKind::InnerHtml
                | OperationKind::OuterHtml
                | OperationKind::Append
                | OperationKind::Prepend
                | OperationKind::InsertAdjacentHtml
                | OperationKind::Remove
                | OperationKind::Replace
                | OperationKind::Morph
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown operation `{0}`")]
pub struct UnknownKind(pub String);

impl FromStr for OperationKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperationKind::from_name(s).ok_or_else(|| UnknownKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique_and_parse_back() {
        assert_eq!(OperationKind::ALL.len(), 28);
        for kind in OperationKind::ALL {
            assert_eq!(kind.name().parse::<OperationKind>(), Ok(*kind));
        }
        let mut names: Vec<_> = OperationKind::ALL.iter().map(|k| k.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 28);
    }

    #[test]
    fn wire_names_are_case_sensitive() {
        assert!("InnerHtml".parse::<OperationKind>().is_err());
        assert_eq!(
            "inner_html".parse::<OperationKind>(),
            Err(UnknownKind("inner_html".into()))
        );
    }

    #[test]
    fn event_names() {
        assert_eq!(OperationKind::SetAttribute.before_event(), "before-setAttribute");
        assert_eq!(OperationKind::Morph.after_event(), "after-morph");
    }
}
