use chrono::{Datelike, NaiveDateTime};
use serde::Deserialize;

const MONTHS_RU: [&str; 12] = [
    "января",
    "февраля",
    "марта",
    "апреля",
    "мая",
    "июня",
    "июля",
    "августа",
    "сентября",
    "октября",
    "ноября",
    "декабря",
];

const MONTHS_EN: [&str; 12] = [
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
];

/// 日期、计数与标题的展示语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ru,
    En,
}

impl Locale {
    /// `{日} {月份名} {年}`，日不补零
    pub fn format_date(&self, date: &NaiveDateTime) -> String {
        let idx = date.month0() as usize;
        let month = match self {
            Locale::Ru => MONTHS_RU[idx],
            Locale::En => MONTHS_EN[idx],
        };
        format!("{} {} {}", date.day(), month, date.year())
    }

    /// `"{count} {noun}"`，名词取正确的复数形式
    pub fn count_reviews(&self, count: i64) -> String {
        let noun = match self {
            // 计数用于“基于 N 条评价”，所以单数也用属格
            Locale::Ru => plural_ru(count, ["отзыва", "отзыва", "отзывов"]),
            Locale::En => {
                if count == 1 {
                    "review"
                } else {
                    "reviews"
                }
            }
        };
        format!("{} {}", count, noun)
    }

    pub fn review_title(&self, product_id: Option<i64>, user_name: &str) -> String {
        match (self, product_id) {
            (Locale::Ru, Some(id)) => format!("Отзыв на товар - {}", id),
            (Locale::Ru, None) => format!("Отзыв без товара от - {}", user_name),
            (Locale::En, Some(id)) => format!("Review of product {}", id),
            (Locale::En, None) => format!("Review without product from {}", user_name),
        }
    }

    pub fn anonymous_name(&self) -> &'static str {
        match self {
            Locale::Ru => "Аноним",
            Locale::En => crate::models::ANONYMOUS_NAME,
        }
    }
}

fn plural_ru(n: i64, forms: [&'static str; 3]) -> &'static str {
    let n = n.abs();
    let (m10, m100) = (n % 10, n % 100);
    if m10 == 1 && m100 != 11 {
        forms[0]
    } else if (2..=4).contains(&m10) && !(12..=14).contains(&m100) {
        forms[1]
    } else {
        forms[2]
    }
}
