//! Multi-select checkbox list

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use tokio::sync::Mutex;

use super::BackHandler;
use super::Outcome;
use super::SelectHandler;
use super::Widget;
use super::check_payload;
use super::deliver;
use super::go_back;
use crate::codec::Action;
use crate::codec::Args;
use crate::codec::DELIMITER;
use crate::codec::WidgetKind;
use crate::error::BoxError;
use crate::error::ConfigError;
use crate::error::HostError;
use crate::error::ParseError;
use crate::host::Answer;
use crate::host::CallbackContext;
use crate::i18n::Lang;
use crate::keyboard::Keyboard;
use crate::keyboard::KeyboardBuilder;
use crate::registry::Handle;
use crate::registry::InstanceRegistry;

const CHECKED: &str = "✅";
const UNCHECKED: &str = "[  ]";

/// One selectable option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckboxOption {
    pub text: String,
    pub flag: bool,
}

impl CheckboxOption {
    /// Creates an unchecked option.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            flag: false,
        }
    }
}

/// Options keyed by the string carried in their callbacks, in display order.
pub type CheckboxOptions = IndexMap<String, CheckboxOption>;

/// Actions carried by checkbox buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckboxAction {
    Ignore,
    /// Flip the option with this key.
    Check(String),
    Done,
    Back,
}

impl Action for CheckboxAction {
    const KIND: WidgetKind = WidgetKind::Checkbox;

    fn tag(&self) -> &'static str {
        match self {
            Self::Ignore => "IGNORE",
            Self::Check(_) => "CHECK",
            Self::Done => "DONE",
            Self::Back => "BACK",
        }
    }

    fn args(&self) -> Vec<String> {
        match self {
            Self::Check(key) => vec![key.clone()],
            Self::Ignore | Self::Done | Self::Back => Vec::new(),
        }
    }

    fn parse(tag: &str, args: Args<'_>) -> Result<Self, ParseError> {
        match tag {
            "IGNORE" => args.expect("IGNORE", 0).map(|_| Self::Ignore),
            "DONE" => args.expect("DONE", 0).map(|_| Self::Done),
            "BACK" => args.expect("BACK", 0).map(|_| Self::Back),
            "CHECK" => {
                args.expect("CHECK", 1)?;
                match args.text(0) {
                    "" => Err(ParseError::EmptyArgument("key")),
                    key => Ok(Self::Check(key.to_string())),
                }
            }
            other => Err(ParseError::unknown_action(Self::KIND.name(), other)),
        }
    }
}

/// A list of toggleable options with a done button.
pub struct Checkbox {
    handle: Handle,
    options: Mutex<CheckboxOptions>,
    can_select_none: bool,
    lang: Lang,
    on_select: Option<SelectHandler<CheckboxOptions>>,
    on_back: Option<BackHandler>,
    timeout: Duration,
}

impl Checkbox {
    /// Creates a new builder.
    pub fn builder() -> CheckboxBuilder {
        CheckboxBuilder::new()
    }

    /// Renders the current selection.
    pub async fn render(&self) -> Keyboard {
        let options = self.options.lock().await;
        self.render_options(&options)
    }

    /// Returns a snapshot of all options.
    pub async fn options(&self) -> CheckboxOptions {
        self.options.lock().await.clone()
    }

    /// Returns the keys of the checked options, in display order.
    pub async fn selected(&self) -> Vec<String> {
        self.options
            .lock()
            .await
            .iter()
            .filter(|(_, option)| option.flag)
            .map(|(key, _)| key.clone())
            .collect()
    }

    fn render_options(&self, options: &CheckboxOptions) -> Keyboard {
        let texts = self.lang.texts();
        let mut kb = KeyboardBuilder::new();
        for (key, option) in options {
            let mark = if option.flag { CHECKED } else { UNCHECKED };
            kb.add(self.button(option.text.as_str(), CheckboxAction::Ignore));
            kb.add(self.button(mark, CheckboxAction::Check(key.clone())));
        }
        kb.adjust(2);
        kb.row([self.button(texts.done, CheckboxAction::Done)]);
        if self.on_back.is_some() {
            kb.row([self.button(texts.back, CheckboxAction::Back)]);
        }
        kb.build()
    }

    async fn toggle(&self, ctx: &dyn CallbackContext, key: &str) -> Result<(), HostError> {
        let mut options = self.options.lock().await;
        if !options.contains_key(key) {
            log::warn!("[checkbox] {} has no option '{}'", self.handle.token(), key);
            ctx.answer(Answer::alert(self.lang.texts().invalid_request)).await?;
            return Ok(());
        }

        let mut next = options.clone();
        if let Some(option) = next.get_mut(key) {
            option.flag = !option.flag;
        }
        ctx.edit_markup(self.render_options(&next)).await?;
        *options = next;
        drop(options);

        ctx.answer(Answer::ack()).await
    }
}

/// Renders a selection as plain text, one option per line.
pub fn summary(options: &CheckboxOptions) -> String {
    options
        .values()
        .map(|option| {
            let mark = if option.flag { CHECKED } else { UNCHECKED };
            format!("{mark} {}", option.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Widget for Checkbox {
    type Action = CheckboxAction;
    type Output = CheckboxOptions;

    fn handle(&self) -> &Handle {
        &self.handle
    }

    async fn process(
        &self,
        ctx: &dyn CallbackContext,
        action: CheckboxAction,
    ) -> Result<Outcome<CheckboxOptions>, HostError> {
        match action {
            CheckboxAction::Ignore => {
                ctx.answer(Answer::cached(60)).await?;
                Ok(Outcome::Pending)
            }
            CheckboxAction::Check(key) => {
                self.toggle(ctx, &key).await?;
                Ok(Outcome::Pending)
            }
            CheckboxAction::Done => {
                let snapshot = self.options().await;
                if !self.can_select_none && !snapshot.values().any(|option| option.flag) {
                    ctx.answer(Answer::alert(self.lang.texts().select_at_least_one))
                        .await?;
                    return Ok(Outcome::Pending);
                }
                if self.on_select.is_none() {
                    ctx.edit_text(&summary(&snapshot)).await?;
                }
                deliver::<CheckboxAction, _>(ctx, self.on_select.as_ref(), snapshot, self.timeout).await
            }
            CheckboxAction::Back => {
                go_back::<CheckboxAction, _>(ctx, self.on_back.as_ref(), self.timeout).await
            }
        }
    }
}

impl fmt::Debug for Checkbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Checkbox")
            .field("handle", &self.handle)
            .field("can_select_none", &self.can_select_none)
            .field("lang", &self.lang)
            .finish_non_exhaustive()
    }
}

/// Builder for a [`Checkbox`].
#[derive(Default)]
pub struct CheckboxBuilder {
    options: Vec<(String, CheckboxOption)>,
    can_select_none: bool,
    lang: Lang,
    on_select: Option<SelectHandler<CheckboxOptions>>,
    on_back: Option<BackHandler>,
}

impl CheckboxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an unchecked option labelled with its key.
    pub fn option(self, key: impl Into<String>) -> Self {
        let key = key.into();
        let option = CheckboxOption::new(key.clone());
        self.option_with(key, option)
    }

    /// Adds an option with its own label and initial flag.
    pub fn option_with(mut self, key: impl Into<String>, option: CheckboxOption) -> Self {
        self.options.push((key.into(), option));
        self
    }

    /// Adds unchecked options labelled with their keys.
    pub fn options<I, S>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        keys.into_iter().fold(self, |builder, key| builder.option(key))
    }

    /// Allows finishing with nothing checked.
    pub fn can_select_none(mut self, allow: bool) -> Self {
        self.can_select_none = allow;
        self
    }

    pub fn lang(mut self, lang: Lang) -> Self {
        self.lang = lang;
        self
    }

    /// Hands the final selection to `f` instead of returning it.
    pub fn on_select<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a dyn CallbackContext, CheckboxOptions) -> BoxFuture<'a, Result<(), BoxError>>
            + Send
            + Sync
            + 'static,
    {
        self.on_select = Some(Arc::new(f));
        self
    }

    /// Shows a back button that calls `f`.
    pub fn on_back<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a dyn CallbackContext) -> BoxFuture<'a, Result<(), BoxError>>
            + Send
            + Sync
            + 'static,
    {
        self.on_back = Some(Arc::new(f));
        self
    }

    /// Validates the option keys and registers the checkbox.
    pub fn build(self, registry: &InstanceRegistry<Checkbox>) -> Result<Arc<Checkbox>, ConfigError> {
        if self.options.is_empty() {
            return Err(ConfigError::NoOptions);
        }

        let mut seen = HashSet::new();
        for (key, _) in &self.options {
            if key.is_empty() {
                return Err(ConfigError::invalid_key(key, "key is empty"));
            }
            if key.contains(DELIMITER) {
                return Err(ConfigError::invalid_key(key, "key contains ':'"));
            }
            if !seen.insert(key.as_str()) {
                return Err(ConfigError::DuplicateOption(key.clone()));
            }
            check_payload(registry.config(), &CheckboxAction::Check(key.clone()))
                .map_err(|_| ConfigError::invalid_key(key, "key does not fit in a callback"))?;
        }

        let options: CheckboxOptions = self.options.into_iter().collect();
        Ok(registry.register(|handle| Checkbox {
            handle,
            options: Mutex::new(options),
            can_select_none: self.can_select_none,
            lang: self.lang,
            on_select: self.on_select,
            on_back: self.on_back,
            timeout: registry.config().request_timeout,
        }))
    }
}
