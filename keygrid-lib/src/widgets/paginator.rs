//! Paged button list
//!
//! Items come either from an eager list or from a loader that fetches one page
//! at a time. The current page is not stored; it travels in the navigation
//! payloads.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;

use super::BackHandler;
use super::Outcome;
use super::SelectHandler;
use super::Widget;
use super::check_payload;
use super::deliver;
use super::go_back;
use crate::codec::Action;
use crate::codec::Args;
use crate::codec::WidgetKind;
use crate::error::BoxError;
use crate::error::ConfigError;
use crate::error::HostError;
use crate::error::ParseError;
use crate::host::Answer;
use crate::host::CallbackContext;
use crate::host::best_effort;
use crate::i18n::Lang;
use crate::keyboard::Button;
use crate::keyboard::Keyboard;
use crate::keyboard::KeyboardBuilder;
use crate::keyboard::MAX_ROW_WIDTH;
use crate::registry::Handle;
use crate::registry::InstanceRegistry;

/// Largest page size.
pub const MAX_PER_PAGE: u32 = 94;

/// Loads the items of one page: `(page, per_page)`, pages counted from 1.
pub type LazyLoader =
    Arc<dyn Fn(u32, u32) -> BoxFuture<'static, Result<Vec<Button>, BoxError>> + Send + Sync>;

/// Reports the total number of items.
pub type LazyCount = Arc<dyn Fn() -> BoxFuture<'static, Result<usize, BoxError>> + Send + Sync>;

/// Actions carried by paginator buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginatorAction {
    /// Disabled navigation or the page indicator.
    Pass,
    /// Show a page.
    Nav(u32),
    /// Pick the item at `pos` on `page`.
    Select { page: u32, pos: u32 },
    Back,
}

impl Action for PaginatorAction {
    const KIND: WidgetKind = WidgetKind::Paginator;

    fn tag(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Nav(_) => "NAV",
            Self::Select { .. } => "SEL",
            Self::Back => "BACK",
        }
    }

    fn args(&self) -> Vec<String> {
        match self {
            Self::Nav(page) => vec![page.to_string()],
            Self::Select { page, pos } => vec![page.to_string(), pos.to_string()],
            Self::Pass | Self::Back => Vec::new(),
        }
    }

    fn parse(tag: &str, args: Args<'_>) -> Result<Self, ParseError> {
        let page = |idx| args.int_in(idx, "page", 1, i64::from(u32::MAX)).map(|p| p as u32);
        match tag {
            "PASS" => args.expect("PASS", 0).map(|_| Self::Pass),
            "BACK" => args.expect("BACK", 0).map(|_| Self::Back),
            "NAV" => {
                args.expect("NAV", 1)?;
                page(0).map(Self::Nav)
            }
            "SEL" => {
                args.expect("SEL", 2)?;
                let page = page(0)?;
                let pos = args.int_in(1, "pos", 0, i64::from(MAX_PER_PAGE) - 1)? as u32;
                Ok(Self::Select { page, pos })
            }
            other => Err(ParseError::unknown_action(Self::KIND.name(), other)),
        }
    }
}

/// Number of pages needed for `count` items. Never less than one.
pub fn last_page(count: usize, per_page: u32) -> u32 {
    let per_page = per_page.max(1) as usize;
    u32::try_from(count.div_ceil(per_page))
        .unwrap_or(u32::MAX)
        .max(1)
}

/// Index range of the items shown on `page`.
pub fn window(page: u32, per_page: u32) -> Range<usize> {
    let start = (page.max(1) as usize - 1).saturating_mul(per_page as usize);
    start..start.saturating_add(per_page as usize)
}

enum CountSource {
    Fixed(usize),
    Lazy(LazyCount),
}

enum Items {
    Eager(Vec<Button>),
    Lazy { loader: LazyLoader, count: CountSource },
}

/// A paged list of buttons with `<< < p / n > >>` navigation.
///
/// # Example
///
/// ```ignore
/// let paginator = Paginator::builder()
///     .data(products.iter().map(|p| Button::new(&p.name, format!("product:{}", p.id))))
///     .per_page(5)
///     .on_select(|ctx, payload| Box::pin(async move { show_product(ctx, &payload).await }))
///     .build(router.paginators())?;
/// send_message("Products", paginator.render().await?).await?;
/// ```
pub struct Paginator {
    handle: Handle,
    items: Items,
    per_page: u32,
    per_row: usize,
    lang: Lang,
    on_select: Option<SelectHandler<String>>,
    on_back: Option<BackHandler>,
    timeout: Duration,
}

impl Paginator {
    /// Creates a new builder.
    pub fn builder() -> PaginatorBuilder {
        PaginatorBuilder::new()
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Returns the total number of items.
    pub async fn count(&self) -> Result<usize, BoxError> {
        match &self.items {
            Items::Eager(items) => Ok(items.len()),
            Items::Lazy {
                count: CountSource::Fixed(count),
                ..
            } => Ok(*count),
            Items::Lazy {
                count: CountSource::Lazy(count),
                ..
            } => count().await,
        }
    }

    /// Returns the number of pages.
    pub async fn last_page(&self) -> Result<u32, BoxError> {
        Ok(last_page(self.count().await?, self.per_page))
    }

    /// Renders the first page.
    pub async fn render(&self) -> Result<Keyboard, BoxError> {
        self.render_page(1).await
    }

    /// Renders `page`, clamped into the existing pages.
    pub async fn render_page(&self, page: u32) -> Result<Keyboard, BoxError> {
        let last = self.last_page().await?;
        let page = page.clamp(1, last);
        let items = self.page_items(page).await?;

        let mut kb = KeyboardBuilder::new();
        for (pos, item) in items.into_iter().enumerate() {
            let item = match self.on_select {
                Some(_) => self.button(
                    item.text,
                    PaginatorAction::Select {
                        page,
                        pos: pos as u32,
                    },
                ),
                None => item,
            };
            kb.add(item);
        }
        kb.adjust(self.per_row);

        let nav = |enabled: bool, label: &str, target: u32| {
            let action = if enabled {
                PaginatorAction::Nav(target)
            } else {
                PaginatorAction::Pass
            };
            self.button(label, action)
        };
        kb.row([
            nav(page > 1, "<<", 1),
            nav(page > 1, "<", page.saturating_sub(1)),
            self.button(format!("{page} / {last}"), PaginatorAction::Pass),
            nav(page < last, ">", page.saturating_add(1)),
            nav(page < last, ">>", last),
        ]);
        kb.row([self.button(self.lang.texts().page_back, PaginatorAction::Back)]);
        Ok(kb.build())
    }

    async fn page_items(&self, page: u32) -> Result<Vec<Button>, BoxError> {
        match &self.items {
            Items::Eager(items) => {
                let range = window(page, self.per_page);
                let end = range.end.min(items.len());
                Ok(items.get(range.start..end).unwrap_or_default().to_vec())
            }
            Items::Lazy { loader, .. } => {
                let mut items = loader(page, self.per_page).await?;
                items.truncate(self.per_page as usize);
                Ok(items)
            }
        }
    }

    async fn navigate(&self, ctx: &dyn CallbackContext, page: u32) -> Result<(), HostError> {
        match self.render_page(page).await {
            Ok(keyboard) => {
                log::debug!("[paginator] {} -> page {}", self.handle.token(), page);
                ctx.edit_markup(keyboard).await?;
                ctx.answer(Answer::ack()).await
            }
            Err(e) => {
                log::error!("[paginator] {} failed to load page {}: {}", self.handle.token(), page, e);
                best_effort("answer", self.timeout, ctx.answer(Answer::ack())).await;
                Ok(())
            }
        }
    }

    async fn select(
        &self,
        ctx: &dyn CallbackContext,
        page: u32,
        pos: u32,
    ) -> Result<Outcome<String>, HostError> {
        let item = match self.page_items(page).await {
            Ok(items) => items.into_iter().nth(pos as usize),
            Err(e) => {
                log::error!("[paginator] {} failed to load page {}: {}", self.handle.token(), page, e);
                None
            }
        };
        let Some(item) = item else {
            ctx.answer(Answer::alert(self.lang.texts().invalid_request)).await?;
            return Ok(Outcome::Pending);
        };
        deliver::<PaginatorAction, _>(ctx, self.on_select.as_ref(), item.payload, self.timeout).await
    }
}

#[async_trait]
impl Widget for Paginator {
    type Action = PaginatorAction;
    /// Payload of the picked item.
    type Output = String;

    fn handle(&self) -> &Handle {
        &self.handle
    }

    async fn process(
        &self,
        ctx: &dyn CallbackContext,
        action: PaginatorAction,
    ) -> Result<Outcome<String>, HostError> {
        match action {
            PaginatorAction::Pass => {
                ctx.answer(Answer::cached(120)).await?;
                Ok(Outcome::Pending)
            }
            PaginatorAction::Nav(page) => {
                self.navigate(ctx, page).await?;
                Ok(Outcome::Pending)
            }
            PaginatorAction::Select { page, pos } => self.select(ctx, page, pos).await,
            PaginatorAction::Back => {
                if self.on_back.is_none() {
                    ctx.answer(Answer::cached(120)).await?;
                }
                go_back::<PaginatorAction, _>(ctx, self.on_back.as_ref(), self.timeout).await
            }
        }
    }
}

impl fmt::Debug for Paginator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match self.items {
            Items::Eager(_) => "eager",
            Items::Lazy { .. } => "lazy",
        };
        f.debug_struct("Paginator")
            .field("handle", &self.handle)
            .field("source", &source)
            .field("per_page", &self.per_page)
            .field("per_row", &self.per_row)
            .finish_non_exhaustive()
    }
}

/// Builder for a [`Paginator`].
pub struct PaginatorBuilder {
    data: Option<Vec<Button>>,
    loader: Option<LazyLoader>,
    count: Option<CountSource>,
    per_page: u32,
    per_row: usize,
    lang: Lang,
    on_select: Option<SelectHandler<String>>,
    on_back: Option<BackHandler>,
}

impl Default for PaginatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PaginatorBuilder {
    /// Creates a builder for ten items per page, one per row.
    pub fn new() -> Self {
        Self {
            data: None,
            loader: None,
            count: None,
            per_page: 10,
            per_row: 1,
            lang: Lang::default(),
            on_select: None,
            on_back: None,
        }
    }

    /// Pages through a fixed list of buttons.
    pub fn data(mut self, items: impl IntoIterator<Item = Button>) -> Self {
        self.data = Some(items.into_iter().collect());
        self
    }

    /// Loads each page on demand. Requires a count source.
    pub fn lazy_data<F>(mut self, loader: F) -> Self
    where
        F: Fn(u32, u32) -> BoxFuture<'static, Result<Vec<Button>, BoxError>> + Send + Sync + 'static,
    {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Sets a fixed item count for lazy data.
    pub fn count(mut self, count: usize) -> Self {
        self.count = Some(CountSource::Fixed(count));
        self
    }

    /// Asks `count` for the item count on every render.
    pub fn lazy_count<F>(mut self, count: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<usize, BoxError>> + Send + Sync + 'static,
    {
        self.count = Some(CountSource::Lazy(Arc::new(count)));
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn per_row(mut self, per_row: usize) -> Self {
        self.per_row = per_row;
        self
    }

    pub fn lang(mut self, lang: Lang) -> Self {
        self.lang = lang;
        self
    }

    /// Routes item presses through the paginator and hands `f` the pressed
    /// item's own payload.
    pub fn on_select<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a dyn CallbackContext, String) -> BoxFuture<'a, Result<(), BoxError>>
            + Send
            + Sync
            + 'static,
    {
        self.on_select = Some(Arc::new(f));
        self
    }

    /// Calls `f` when the user presses back.
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

    /// Validates the data sources and limits and registers the paginator.
    pub fn build(self, registry: &InstanceRegistry<Paginator>) -> Result<Arc<Paginator>, ConfigError> {
        ConfigError::check_range("per_page", self.per_page as usize, 1, MAX_PER_PAGE as usize)?;
        ConfigError::check_range("per_row", self.per_row, 1, MAX_ROW_WIDTH)?;

        let items = match (self.data, self.loader, self.count) {
            (Some(_), Some(_), _) => return Err(ConfigError::ConflictingData),
            (Some(_), None, Some(_)) => return Err(ConfigError::UnexpectedCount),
            (Some(data), None, None) if !data.is_empty() => Items::Eager(data),
            (None, Some(_), None) => return Err(ConfigError::MissingCount),
            (None, Some(loader), Some(count)) => Items::Lazy { loader, count },
            _ => return Err(ConfigError::MissingData),
        };

        check_payload(
            registry.config(),
            &PaginatorAction::Select {
                page: u32::MAX,
                pos: MAX_PER_PAGE - 1,
            },
        )?;

        Ok(registry.register(|handle| Paginator {
            handle,
            items,
            per_page: self.per_page,
            per_row: self.per_row,
            lang: self.lang,
            on_select: self.on_select,
            on_back: self.on_back,
            timeout: registry.config().request_timeout,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::codec;
    use crate::codec::MAX_PAYLOAD_LEN;
    use crate::host::RecordingContext;
    use crate::registry::Token;

    #[test]
    fn test_action_roundtrip() {
        let handle = Handle::new(Token::parse("a!{~").unwrap(), u64::MAX);
        let actions = [
            PaginatorAction::Pass,
            PaginatorAction::Nav(1),
            PaginatorAction::Nav(u32::MAX),
            PaginatorAction::Select { page: 1, pos: 0 },
            PaginatorAction::Select {
                page: u32::MAX,
                pos: MAX_PER_PAGE - 1,
            },
            PaginatorAction::Back,
        ];
        for action in actions {
            let payload = codec::encode(&action, &handle);
            assert!(payload.len() <= MAX_PAYLOAD_LEN, "{payload} is too long");
            assert_eq!(codec::decode::<PaginatorAction>(&payload), Ok((action, handle.clone())));
        }
    }

    fn items(n: usize) -> Vec<Button> {
        (0..n)
            .map(|i| Button::new(format!("item {i}"), format!("item:{i}")))
            .collect()
    }

    fn paginator(builder: PaginatorBuilder) -> Arc<Paginator> {
        builder.build(&InstanceRegistry::default()).unwrap()
    }

    fn item_texts(kb: &Keyboard) -> Vec<String> {
        kb.buttons()
            .filter(|b| b.text.starts_with("item"))
            .map(|b| b.text.clone())
            .collect()
    }

    #[test]
    fn test_page_math() {
        assert_eq!(last_page(25, 10), 3);
        assert_eq!(last_page(30, 10), 3);
        assert_eq!(last_page(31, 10), 4);
        assert_eq!(last_page(0, 10), 1);
        assert_eq!(window(1, 10), 0..10);
        assert_eq!(window(3, 10), 20..30);
    }

    #[test]
    fn test_parse_actions() {
        assert_eq!(
            codec::decode::<PaginatorAction>("pag:SEL:2:9:abcd:1").map(|(a, _)| a),
            Ok(PaginatorAction::Select { page: 2, pos: 9 })
        );
        assert!(matches!(
            codec::decode::<PaginatorAction>("pag:NAV:0:abcd:1"),
            Err(ParseError::OutOfRange { field: "page", .. })
        ));
        assert!(matches!(
            codec::decode::<PaginatorAction>("pag:NAV:01:abcd:1"),
            Err(ParseError::InvalidNumber { .. })
        ));
        assert!(matches!(
            codec::decode::<PaginatorAction>("pag:SEL:1:94:abcd:1"),
            Err(ParseError::OutOfRange { field: "pos", .. })
        ));
    }

    #[test]
    fn test_build_validation() {
        let registry = InstanceRegistry::default();
        let loader = |_page: u32, _per_page: u32| -> BoxFuture<'static, Result<Vec<Button>, BoxError>> {
            Box::pin(async { Ok::<_, BoxError>(Vec::new()) })
        };

        assert_eq!(
            Paginator::builder().build(&registry).unwrap_err(),
            ConfigError::MissingData
        );
        assert_eq!(
            Paginator::builder()
                .data(items(3))
                .lazy_data(loader)
                .count(3)
                .build(&registry)
                .unwrap_err(),
            ConfigError::ConflictingData
        );
        assert_eq!(
            Paginator::builder().lazy_data(loader).build(&registry).unwrap_err(),
            ConfigError::MissingCount
        );
        assert_eq!(
            Paginator::builder()
                .data(items(3))
                .count(3)
                .build(&registry)
                .unwrap_err(),
            ConfigError::UnexpectedCount
        );
        assert!(matches!(
            Paginator::builder().data(items(3)).per_page(95).build(&registry),
            Err(ConfigError::OutOfRange { field: "per_page", .. })
        ));
        assert!(matches!(
            Paginator::builder().data(items(3)).per_row(9).build(&registry),
            Err(ConfigError::OutOfRange { field: "per_row", .. })
        ));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_first_page() {
        let pg = paginator(Paginator::builder().data(items(25)));
        let kb = pg.render().await.unwrap();
        assert_eq!(item_texts(&kb).len(), 10);
        assert_eq!(kb.button("item 0").unwrap().payload, "item:0");
        assert_eq!(kb.button("1 / 3").unwrap().payload, pg.callback(&PaginatorAction::Pass));
        assert_eq!(kb.button("<<").unwrap().payload, pg.callback(&PaginatorAction::Pass));
        assert_eq!(kb.button(">").unwrap().payload, pg.callback(&PaginatorAction::Nav(2)));
        assert_eq!(kb.button(">>").unwrap().payload, pg.callback(&PaginatorAction::Nav(3)));
        assert!(kb.button("<-- Go Back").is_some());
    }

    #[tokio::test]
    async fn test_nav_to_last_page() {
        let pg = paginator(Paginator::builder().data(items(25)).per_page(10).per_row(1));
        let ctx = RecordingContext::new();
        let outcome = pg.process(&ctx, PaginatorAction::Nav(3)).await.unwrap();
        assert_eq!(outcome, Outcome::Pending);

        let kb = ctx.last_markup().unwrap();
        let expected: Vec<String> = (20..25).map(|i| format!("item {i}")).collect();
        assert_eq!(item_texts(&kb), expected);
        assert_eq!(kb.rows()[0].len(), 1);
        assert_eq!(kb.button(">").unwrap().payload, pg.callback(&PaginatorAction::Pass));
        assert_eq!(kb.button("<").unwrap().payload, pg.callback(&PaginatorAction::Nav(2)));
        assert_eq!(ctx.last_answer(), Some(Answer::ack()));
    }

    #[tokio::test]
    async fn test_nav_clamps_out_of_range_pages() {
        let pg = paginator(Paginator::builder().data(items(25)));
        let ctx = RecordingContext::new();
        pg.process(&ctx, PaginatorAction::Nav(7)).await.unwrap();
        assert!(ctx.last_markup().unwrap().button("3 / 3").is_some());
    }

    #[tokio::test]
    async fn test_lazy_loader() {
        let loads = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&loads);
        let pg = paginator(
            Paginator::builder()
                .lazy_data(move |page, per_page| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Box::pin(async move {
                        let start = (page - 1) * per_page;
                        let page: Vec<Button> = (start..start + per_page)
                            .map(|i| Button::new(format!("item {i}"), format!("item:{i}")))
                            .collect();
                        Ok::<_, BoxError>(page)
                    })
                })
                .lazy_count(|| Box::pin(async { Ok::<_, BoxError>(12) }))
                .per_page(5)
                .per_row(2),
        );
        let kb = pg.render_page(3).await.unwrap();
        assert_eq!(item_texts(&kb), vec!["item 10", "item 11", "item 12", "item 13", "item 14"]);
        assert_eq!(kb.rows()[0].len(), 2);
        assert!(kb.button("3 / 3").is_some());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_select_wraps_items() {
        let pg = paginator(
            Paginator::builder()
                .data(items(25))
                .on_select(|ctx, payload| {
                    Box::pin(async move {
                        ctx.edit_text(&format!("picked {payload}")).await?;
                        Ok::<(), BoxError>(())
                    })
                }),
        );
        let kb = pg.render_page(2).await.unwrap();
        assert_eq!(
            kb.button("item 13").unwrap().payload,
            pg.callback(&PaginatorAction::Select { page: 2, pos: 3 })
        );

        let ctx = RecordingContext::new();
        let outcome = pg
            .process(&ctx, PaginatorAction::Select { page: 2, pos: 3 })
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Delegated);
        assert_eq!(ctx.last_text().as_deref(), Some("picked item:13"));

        let outcome = pg
            .process(&ctx, PaginatorAction::Select { page: 3, pos: 9 })
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Pending);
        assert_eq!(ctx.last_answer(), Some(Answer::alert("Invalid request")));
    }

    #[tokio::test]
    async fn test_back_acknowledges() {
        let pg = paginator(Paginator::builder().data(items(3)));
        let ctx = RecordingContext::new();
        let outcome = pg.process(&ctx, PaginatorAction::Back).await.unwrap();
        assert_eq!(outcome, Outcome::Completed(None));
        assert_eq!(ctx.answers(), vec![Answer::cached(120)]);
    }
}
