mod console;

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use chrono::TimeDelta;
use clap::{Parser, Subcommand};
use keygrid_lib::error::BoxError;
use keygrid_lib::i18n::Lang;
use keygrid_lib::keyboard::Button;
use keygrid_lib::keyboard::Keyboard;
use keygrid_lib::registry::RegistryConfig;
use keygrid_lib::widgets::Calendar;
use keygrid_lib::widgets::Checkbox;
use keygrid_lib::widgets::Outcome;
use keygrid_lib::widgets::Paginator;
use keygrid_lib::widgets::TimeSelector;
use keygrid_lib::widgets::TimeSelectorStyle;
use keygrid_lib::{Dispatched, Router, RouterConfig};
use simplelog::{Config, LevelFilter, WriteLogger};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::console::ConsoleContext;
use crate::console::print_keyboard;

#[derive(Parser)]
#[command(name = "keygrid")]
#[command(about = "Drive inline keyboard widgets from the terminal")]
struct Cli {
    /// Label language (en, ru, uz)
    #[arg(long, default_value_t = Lang::En)]
    lang: Lang,

    /// Maximum live widgets per kind
    #[arg(long, default_value_t = 1000)]
    capacity: usize,

    /// Log file
    #[arg(long, default_value = "keygrid.log")]
    log_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pick a date
    Calendar {
        /// Furthest selectable day, counted from today
        #[arg(long)]
        max_days: Option<i64>,
        /// Forbid days before today
        #[arg(long)]
        no_past: bool,
        /// Show today / tomorrow / overmorrow shortcuts
        #[arg(long)]
        quick: bool,
    },
    /// Tick any number of options
    Checkbox {
        /// Option keys
        #[arg(required = true)]
        options: Vec<String>,
        /// Allow finishing with nothing ticked
        #[arg(long)]
        allow_none: bool,
    },
    /// Browse a numbered list
    Pages {
        /// Number of items
        #[arg(long, default_value_t = 42)]
        items: usize,
        #[arg(long, default_value_t = 10)]
        per_page: u32,
        #[arg(long, default_value_t = 2)]
        per_row: usize,
        /// Route item presses through the paginator
        #[arg(long)]
        select: bool,
    },
    /// Pick a time of day
    Time {
        /// Use the hour/minute grid instead of the stepper
        #[arg(long)]
        grid: bool,
        #[arg(long, default_value_t = 5)]
        step: u32,
        /// Let minute changes roll into the hour
        #[arg(long)]
        carry: bool,
        /// Reject times that already passed
        #[arg(long)]
        future_only: bool,
        /// Start this many minutes from now
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_file = File::create(&cli.log_file).expect("Failed to create log file");
    WriteLogger::init(LevelFilter::Debug, Config::default(), log_file)
        .expect("Failed to initialize logger");

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), BoxError> {
    let config = RouterConfig::default()
        .with_lang(cli.lang)
        .with_registry(RegistryConfig::default().with_capacity(cli.capacity));
    let router = Router::new(config)?;
    let lang = cli.lang;

    let keyboard = match cli.command {
        Commands::Calendar {
            max_days,
            no_past,
            quick,
        } => {
            let mut builder = Calendar::builder()
                .lang(lang)
                .can_select_past(!no_past)
                .show_quick_buttons(quick)
                .remove_on_action(true)
                .on_select(|ctx, date| {
                    Box::pin(async move {
                        ctx.edit_text(&format!("Date selected: {}", date.format("%d/%m/%Y")))
                            .await?;
                        Ok::<(), BoxError>(())
                    })
                });
            if let Some(days) = max_days {
                builder = builder.max_range(TimeDelta::days(days));
            }
            builder.build(router.calendars())?.render()
        }
        Commands::Checkbox {
            options,
            allow_none,
        } => Checkbox::builder()
            .options(options)
            .can_select_none(allow_none)
            .lang(lang)
            .build(router.checkboxes())?
            .render()
            .await,
        Commands::Pages {
            items,
            per_page,
            per_row,
            select,
        } => {
            let mut builder = Paginator::builder()
                .data((1..=items).map(|i| Button::new(format!("Item {i}"), format!("item:{i}"))))
                .per_page(per_page)
                .per_row(per_row)
                .lang(lang);
            if select {
                builder = builder.on_select(|ctx, payload| {
                    Box::pin(async move {
                        ctx.edit_text(&format!("Opened {payload}")).await?;
                        ctx.remove_markup().await?;
                        Ok::<(), BoxError>(())
                    })
                });
            }
            builder.build(router.paginators())?.render().await?
        }
        Commands::Time {
            grid,
            step,
            carry,
            future_only,
            offset,
        } => {
            let style = if grid {
                TimeSelectorStyle::Grid
            } else {
                TimeSelectorStyle::Modern
            };
            TimeSelector::builder()
                .style(style)
                .minute_step(step)
                .carry_over(carry)
                .future_only(future_only)
                .offset_minutes(offset)
                .lang(lang)
                .build(router.time_selectors())?
                .render()
                .await
        }
    };

    interact(&router, keyboard).await
}

/// Reads button numbers (or raw payloads) from stdin until the widget
/// finishes or the keyboard is gone.
async fn interact(router: &Router, keyboard: Keyboard) -> Result<(), BoxError> {
    let ctx = ConsoleContext::new(keyboard);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let Some(keyboard) = ctx.keyboard() else {
            println!("(keyboard removed)");
            return Ok(());
        };
        print_keyboard(&keyboard);
        print!("press> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "q" {
            return Ok(());
        }

        let payload = match line.parse::<usize>() {
            Ok(n) => match n.checked_sub(1).and_then(|i| keyboard.buttons().nth(i)) {
                Some(button) => button.payload.clone(),
                None => {
                    println!("No button {n}");
                    continue;
                }
            },
            Err(_) => line.to_string(),
        };

        let result = router.dispatch(&ctx, &payload).await?;
        report(&result, &payload);
        if result.is_terminal() {
            return Ok(());
        }
    }
}

fn report(result: &Dispatched, payload: &str) {
    match result {
        Dispatched::Calendar(Outcome::Completed(Some(date))) => println!("Date: {date}"),
        Dispatched::Checkbox(Outcome::Completed(Some(options))) => {
            let ticked: Vec<&str> = options
                .iter()
                .filter(|(_, option)| option.flag)
                .map(|(key, _)| key.as_str())
                .collect();
            println!("Selected: [{}]", ticked.join(", "));
        }
        Dispatched::Paginator(Outcome::Completed(Some(item))) => println!("Item: {item}"),
        Dispatched::TimeSelector(Outcome::Completed(Some(time))) => {
            println!("Time: {}", time.format("%H:%M"))
        }
        Dispatched::Calendar(Outcome::Completed(None))
        | Dispatched::Checkbox(Outcome::Completed(None))
        | Dispatched::Paginator(Outcome::Completed(None))
        | Dispatched::TimeSelector(Outcome::Completed(None)) => println!("Cancelled"),
        Dispatched::Expired(kind) => println!("That {kind} keyboard expired"),
        Dispatched::Invalid(e) => println!("Rejected: {e}"),
        Dispatched::Unmatched => println!("Not a widget payload, the host would handle '{payload}'"),
        _ => {}
    }
}
