//! Inline keyboard model and layout helpers.

/// Most buttons the platform shows in one row.
pub const MAX_ROW_WIDTH: usize = 8;

/// A clickable cell carrying an opaque callback payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    /// Visible label.
    pub text: String,
    /// Payload the platform sends back when the button is pressed.
    pub payload: String,
}

impl Button {
    /// Creates a new button.
    pub fn new(text: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            payload: payload.into(),
        }
    }
}

/// A grid of buttons attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// Creates a keyboard from explicit rows.
    pub fn from_rows(rows: Vec<Vec<Button>>) -> Self {
        Self { rows }
    }

    /// Returns the rows of this keyboard.
    pub fn rows(&self) -> &[Vec<Button>] {
        &self.rows
    }

    /// Iterates over all buttons, row by row.
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }

    /// Returns the first button with the given label.
    pub fn button(&self, text: &str) -> Option<&Button> {
        self.buttons().find(|button| button.text == text)
    }

    /// Returns the total number of buttons.
    pub fn len(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Returns `true` if the keyboard has no buttons.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Incremental keyboard builder.
///
/// Buttons added with [`add`](Self::add) stay pending until
/// [`adjust`](Self::adjust) lays them out; [`row`](Self::row) appends a
/// complete row.
///
/// # Example
///
/// ```
/// use keygrid_lib::keyboard::{Button, KeyboardBuilder};
///
/// let mut kb = KeyboardBuilder::new();
/// for i in 0..5 {
///     kb.add(Button::new(i.to_string(), format!("n:{i}")));
/// }
/// kb.adjust(2);
/// kb.row([Button::new("Done", "done")]);
/// let keyboard = kb.build();
/// assert_eq!(keyboard.rows().len(), 4);
/// ```
#[derive(Debug, Default)]
pub struct KeyboardBuilder {
    rows: Vec<Vec<Button>>,
    pending: Vec<Button>,
}

impl KeyboardBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a button for the next [`adjust`](Self::adjust).
    pub fn add(&mut self, button: Button) -> &mut Self {
        self.pending.push(button);
        self
    }

    /// Lays out queued buttons in rows of `width`.
    pub fn adjust(&mut self, width: usize) -> &mut Self {
        let width = width.clamp(1, MAX_ROW_WIDTH);
        let pending = std::mem::take(&mut self.pending);
        let mut iter = pending.into_iter().peekable();
        while iter.peek().is_some() {
            self.rows.push(iter.by_ref().take(width).collect());
        }
        self
    }

    /// Appends one complete row.
    pub fn row(&mut self, buttons: impl IntoIterator<Item = Button>) -> &mut Self {
        self.adjust(MAX_ROW_WIDTH);
        let row: Vec<Button> = buttons.into_iter().collect();
        if !row.is_empty() {
            self.rows.push(row);
        }
        self
    }

    /// Appends all rows of another builder.
    pub fn attach(&mut self, other: KeyboardBuilder) -> &mut Self {
        self.adjust(MAX_ROW_WIDTH);
        self.rows.extend(other.build().rows);
        self
    }

    /// Finishes the keyboard.
    pub fn build(mut self) -> Keyboard {
        self.adjust(MAX_ROW_WIDTH);
        Keyboard { rows: self.rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: usize) -> Vec<Button> {
        (0..n).map(|i| Button::new(i.to_string(), i.to_string())).collect()
    }

    #[test]
    fn test_adjust_chunks_pending() {
        let mut kb = KeyboardBuilder::new();
        for button in numbered(7) {
            kb.add(button);
        }
        kb.adjust(3);
        let keyboard = kb.build();
        let widths: Vec<usize> = keyboard.rows().iter().map(Vec::len).collect();
        assert_eq!(widths, vec![3, 3, 1]);
    }

    #[test]
    fn test_row_flushes_pending_first() {
        let mut kb = KeyboardBuilder::new();
        kb.add(Button::new("a", "a"));
        kb.row([Button::new("b", "b"), Button::new("c", "c")]);
        let keyboard = kb.build();
        assert_eq!(keyboard.rows().len(), 2);
        assert_eq!(keyboard.rows()[0][0].text, "a");
        assert_eq!(keyboard.len(), 3);
    }

    #[test]
    fn test_attach_appends_rows() {
        let mut inner = KeyboardBuilder::new();
        for button in numbered(14) {
            inner.add(button);
        }
        inner.adjust(7);

        let mut kb = KeyboardBuilder::new();
        kb.row([Button::new("head", "h")]);
        kb.attach(inner);
        kb.row([Button::new("tail", "t")]);
        let keyboard = kb.build();
        assert_eq!(keyboard.rows().len(), 4);
        assert_eq!(keyboard.rows()[3][0].text, "tail");
        assert_eq!(keyboard.button("13").map(|b| b.payload.as_str()), Some("13"));
    }
}
