//! Label translations
//!
//! Static text tables for the bundled languages. Widgets pick their labels
//! from [`Lang::texts`].

use std::fmt;
use std::str::FromStr;

use crate::codec::WidgetKind;
use crate::error::ConfigError;

/// Bundled widget languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lang {
    /// English.
    #[default]
    En,
    /// Russian.
    Ru,
    /// Uzbek.
    Uz,
}

impl Lang {
    /// All bundled languages.
    pub const ALL: [Lang; 3] = [Lang::En, Lang::Ru, Lang::Uz];

    /// Returns the two-letter language code.
    pub fn code(&self) -> &'static str {
        match self {
            Lang::En => "EN",
            Lang::Ru => "RU",
            Lang::Uz => "UZ",
        }
    }

    /// Returns the label table for this language.
    pub fn texts(&self) -> &'static Texts {
        match self {
            Lang::En => &EN,
            Lang::Ru => &RU,
            Lang::Uz => &UZ,
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Lang {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Lang::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| ConfigError::UnsupportedLanguage(code.to_string()))
    }
}

/// Labels and notices for one language.
#[derive(Debug)]
pub struct Texts {
    pub today: &'static str,
    pub tomorrow: &'static str,
    pub overmorrow: &'static str,
    /// Weekday names, Monday first.
    pub weekdays: [&'static str; 7],
    /// Month names, January first.
    pub months: [&'static str; 12],
    pub warn_past: &'static str,
    pub warn_future: &'static str,
    pub warn_past_time: &'static str,
    pub back: &'static str,
    pub done: &'static str,
    pub page_back: &'static str,
    pub select_at_least_one: &'static str,
    pub invalid_request: &'static str,
    pub expired_calendar: &'static str,
    pub expired_checkbox: &'static str,
    pub expired_paginator: &'static str,
    pub expired_time_selector: &'static str,
}

impl Texts {
    /// Returns the name of `month` (1-based).
    pub fn month(&self, month: u32) -> &'static str {
        self.months[(month.clamp(1, 12) - 1) as usize]
    }

    /// Returns the notice shown when a keyboard of `kind` is no longer live.
    pub fn expired(&self, kind: WidgetKind) -> &'static str {
        match kind {
            WidgetKind::Calendar => self.expired_calendar,
            WidgetKind::Checkbox => self.expired_checkbox,
            WidgetKind::Paginator => self.expired_paginator,
            WidgetKind::TimeSelector => self.expired_time_selector,
        }
    }
}

static EN: Texts = Texts {
    today: "Today",
    tomorrow: "Tomorrow",
    overmorrow: "Overmorrow",
    weekdays: ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
    months: [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ],
    warn_past: "Can't select past",
    warn_future: "Can't select far future",
    warn_past_time: "Can't select past time",
    back: "🔙 Back",
    done: "☑️ Done",
    page_back: "<-- Go Back",
    select_at_least_one: "At least one option must be selected",
    invalid_request: "Invalid request",
    expired_calendar: "Calendar keyboard is expired",
    expired_checkbox: "This checkbox keyboard is expired",
    expired_paginator: "This page list is expired",
    expired_time_selector: "This time picker is expired",
};

static RU: Texts = Texts {
    today: "Сегодня",
    tomorrow: "Завтра",
    overmorrow: "Послезавтра",
    weekdays: ["Пн", "Вт", "Ср", "Чт", "Пт", "Сб", "Вс"],
    months: [
        "Январь",
        "Февраль",
        "Март",
        "Апрель",
        "Май",
        "Июнь",
        "Июль",
        "Август",
        "Сентябрь",
        "Октябрь",
        "Ноябрь",
        "Декабрь",
    ],
    warn_past: "Нельзя выбрать прошедшую дату",
    warn_future: "Нельзя выбрать далёкое будущее",
    warn_past_time: "Нельзя выбрать прошедшее время",
    back: "🔙 Назад",
    done: "☑️ Готово",
    page_back: "<-- Назад",
    select_at_least_one: "Выберите хотя бы один вариант",
    invalid_request: "Некорректный запрос",
    expired_calendar: "Срок действия календарной клавиатуры истёк",
    expired_checkbox: "Срок действия клавиатуры выбора истёк",
    expired_paginator: "Срок действия списка страниц истёк",
    expired_time_selector: "Срок действия выбора времени истёк",
};

static UZ: Texts = Texts {
    today: "Bugun",
    tomorrow: "Ertaga",
    overmorrow: "Indinga",
    weekdays: ["Du", "Se", "Ch", "Pa", "Ju", "Sh", "Ya"],
    months: [
        "Yanvar",
        "Fevral",
        "Mart",
        "Aprel",
        "May",
        "Iyun",
        "Iyul",
        "Avgust",
        "Sentabr",
        "Oktabr",
        "Noyabr",
        "Dekabr",
    ],
    warn_past: "O‘tgan sanani tanlab bo‘lmaydi",
    warn_future: "Juda uzoq kelajak sanani tanlab bo‘lmaydi",
    warn_past_time: "O‘tgan vaqtni tanlab bo‘lmaydi",
    back: "🔙 Orqaga",
    done: "☑️ Tayyor",
    page_back: "<-- Orqaga",
    select_at_least_one: "Kamida bitta variantni tanlang",
    invalid_request: "Noto‘g‘ri so‘rov",
    expired_calendar: "Kalendar klaviaturasi muddati tugagan",
    expired_checkbox: "Belgilash klaviaturasi muddati tugagan",
    expired_paginator: "Sahifalar ro‘yxati muddati tugagan",
    expired_time_selector: "Vaqt tanlash klaviaturasi muddati tugagan",
};
