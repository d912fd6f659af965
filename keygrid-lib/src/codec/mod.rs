//! Callback payload codec
//!
//! Every button a widget renders carries a payload of the form
//!
//! ```text
//! prefix:TAG[:arg...]:token:generation
//! ```
//!
//! where `prefix` names the widget kind, `TAG` and its arguments describe the
//! action, and `token`/`generation` identify the instance. The chat platform
//! returns the payload verbatim, so it must stay within [`MAX_PAYLOAD_LEN`].

mod args;

pub use args::*;

use std::fmt;

use crate::error::ParseError;
use crate::registry::Handle;
use crate::registry::Token;

/// Hard limit the platform puts on a callback payload, in bytes.
pub const MAX_PAYLOAD_LEN: usize = 64;

/// Field separator. Never appears in tokens, tags or string arguments.
pub const DELIMITER: char = ':';

/// The widget kinds that own callback payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    Calendar,
    Checkbox,
    Paginator,
    TimeSelector,
}

impl WidgetKind {
    /// All widget kinds.
    pub const ALL: [WidgetKind; 4] = [
        WidgetKind::Calendar,
        WidgetKind::Checkbox,
        WidgetKind::Paginator,
        WidgetKind::TimeSelector,
    ];

    /// Returns the payload prefix.
    pub fn prefix(&self) -> &'static str {
        match self {
            WidgetKind::Calendar => "cal",
            WidgetKind::Checkbox => "chk",
            WidgetKind::Paginator => "pag",
            WidgetKind::TimeSelector => "tms",
        }
    }

    /// Returns the kind owning `prefix`.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.prefix() == prefix)
    }

    /// Returns a human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            WidgetKind::Calendar => "calendar",
            WidgetKind::Checkbox => "checkbox",
            WidgetKind::Paginator => "paginator",
            WidgetKind::TimeSelector => "time selector",
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A closed set of actions one widget kind understands.
///
/// `parse(a.tag(), a.args())` must give back `a` for every action.
pub trait Action: Sized + Send + fmt::Debug {
    /// The kind whose payloads carry these actions.
    const KIND: WidgetKind;

    /// Returns the wire tag.
    fn tag(&self) -> &'static str;

    /// Returns the positional arguments.
    fn args(&self) -> Vec<String>;

    /// Parses an action from its tag and arguments.
    fn parse(tag: &str, args: Args<'_>) -> Result<Self, ParseError>;
}

/// A decoded payload whose action has not been interpreted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCallback {
    pub kind: WidgetKind,
    pub tag: String,
    pub args: Vec<String>,
    pub handle: Handle,
}

impl RawCallback {
    /// Splits a payload into its fields.
    ///
    /// Checks length, kind prefix, token alphabet and generation; the tag and
    /// arguments are checked by [`action`](Self::action).
    pub fn decode(payload: &str) -> Result<Self, ParseError> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(ParseError::TooLong {
                len: payload.len(),
                max: MAX_PAYLOAD_LEN,
            });
        }

        let fields: Vec<&str> = payload.split(DELIMITER).collect();
        let n = fields.len();
        if n < 4 {
            return Err(ParseError::TooFewFields(n));
        }

        let kind = WidgetKind::from_prefix(fields[0])
            .ok_or_else(|| ParseError::UnknownKind(fields[0].to_string()))?;
        let token = Token::parse(fields[n - 2])?;
        let generation = parse_int::<u64>(fields[n - 1], "generation")?;

        Ok(Self {
            kind,
            tag: fields[1].to_string(),
            args: fields[2..n - 2].iter().map(|s| s.to_string()).collect(),
            handle: Handle::new(token, generation),
        })
    }

    /// Joins the fields back into a payload.
    pub fn encode(&self) -> String {
        join(
            self.kind,
            &self.tag,
            self.args.iter().map(String::as_str),
            &self.handle,
        )
    }

    /// Interprets the tag and arguments as an action of `A`.
    pub fn action<A: Action>(&self) -> Result<A, ParseError> {
        if self.kind != A::KIND {
            return Err(ParseError::KindMismatch {
                expected: A::KIND.name(),
                actual: self.kind.name(),
            });
        }
        A::parse(&self.tag, Args::new(&self.args))
    }
}

/// Returns `true` if `payload` starts with a known kind prefix.
///
/// This is the cheap filter a host uses to decide whether a press belongs to
/// these widgets at all; it does not validate the rest of the payload.
pub fn is_widget_payload(payload: &str) -> bool {
    payload
        .split_once(DELIMITER)
        .is_some_and(|(prefix, _)| WidgetKind::from_prefix(prefix).is_some())
}

/// Encodes an action for the instance behind `handle`.
pub fn encode<A: Action>(action: &A, handle: &Handle) -> String {
    let args = action.args();
    join(
        A::KIND,
        action.tag(),
        args.iter().map(String::as_str),
        handle,
    )
}

/// Decodes a payload into an action of `A` and the handle it targets.
pub fn decode<A: Action>(payload: &str) -> Result<(A, Handle), ParseError> {
    let raw = RawCallback::decode(payload)?;
    let action = raw.action::<A>()?;
    Ok((action, raw.handle))
}

fn join<'a>(
    kind: WidgetKind,
    tag: &str,
    args: impl Iterator<Item = &'a str>,
    handle: &Handle,
) -> String {
    let mut out = String::with_capacity(MAX_PAYLOAD_LEN);
    out.push_str(kind.prefix());
    out.push(DELIMITER);
    out.push_str(tag);
    for arg in args {
        out.push(DELIMITER);
        out.push_str(arg);
    }
    out.push(DELIMITER);
    out.push_str(handle.token().as_str());
    out.push(DELIMITER);
    out.push_str(&handle.generation().to_string());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> Handle {
        Handle::new(Token::parse("a!{~").unwrap(), 42)
    }

    #[test]
    fn test_raw_roundtrip() {
        let payload = "cal:DAY:2024:2:29:a!{~:42";
        let raw = RawCallback::decode(payload).unwrap();
        assert_eq!(raw.kind, WidgetKind::Calendar);
        assert_eq!(raw.tag, "DAY");
        assert_eq!(raw.args, vec!["2024", "2", "29"]);
        assert_eq!(raw.handle, handle());
        assert_eq!(raw.encode(), payload);
    }

    #[test]
    fn test_rejects_unknown_prefix() {
        assert_eq!(
            RawCallback::decode("xyz:DAY:ab:1"),
            Err(ParseError::UnknownKind("xyz".to_string()))
        );
    }

    #[test]
    fn test_rejects_too_few_fields() {
        assert_eq!(
            RawCallback::decode("cal:ab:1"),
            Err(ParseError::TooFewFields(3))
        );
    }

    #[test]
    fn test_rejects_bad_generation() {
        for bad in ["cal:IGNORE:ab:", "cal:IGNORE:ab:x1", "cal:IGNORE:ab:+1", "cal:IGNORE:ab:01"] {
            assert!(
                matches!(
                    RawCallback::decode(bad),
                    Err(ParseError::InvalidNumber { field: "generation", .. })
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_bad_token() {
        assert!(matches!(
            RawCallback::decode("cal:IGNORE:a b:1"),
            Err(ParseError::InvalidToken(_))
        ));
        assert!(matches!(
            RawCallback::decode("cal:IGNORE::1"),
            Err(ParseError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_rejects_oversized_payload() {
        let payload = format!("chk:CHECK:{}:abcd:1", "x".repeat(60));
        assert!(matches!(
            RawCallback::decode(&payload),
            Err(ParseError::TooLong { max: MAX_PAYLOAD_LEN, .. })
        ));
    }

    #[test]
    fn test_payload_filter() {
        assert!(is_widget_payload("pag:PASS:abcd:1"));
        assert!(is_widget_payload("tms:garbage"));
        assert!(!is_widget_payload("item:1"));
        assert!(!is_widget_payload("cal"));
    }
}
