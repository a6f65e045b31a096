//! Tokyo venues.

use crate::fetchers::{ExpectedFirstLive, Simple, TimeHandler};
use crate::fetchers::harness::jst;
use crate::querier::Querier;

/// Single schedule page per month, next-page link to the following month.
/// The last month's page links to itself.
pub fn shimokitazawa_alley() -> Simple {
    Simple {
        base_url: "https://shimokitazawa-alley.com".into(),
        initial_url: "https://shimokitazawa-alley.com/schedule/202406/".into(),
        next_selector: "a.next-month".into(),
        live_selector: "article.live".into(),
        title_querier: Some(Querier::new("h3.title")),
        artists_querier: Some(
            Querier::new("p.acts").split_ignore_within(" / ", '（', '）'),
        ),
        price_querier: Some(Querier::new("p.price")),
        time_handler: TimeHandler {
            year: Some(Querier::new("h2.schedule-month")),
            month: Some(Querier::new("p.date").before("/")),
            day: Some(Querier::new("p.date").after("/")),
            open_time: Some(Querier::new("p.time").after("OPEN ")),
            start_time: Some(Querier::new("p.time").after("START ")),
            is_month_in_live: true,
            ..Default::default()
        },
        prefecture_name: "tokyo".into(),
        area_name: "shimokitazawa".into(),
        venue_id: "shimokitazawa-alley".into(),
        latitude: 35.661,
        longitude: 139.668,
        expected: ExpectedFirstLive {
            live_count: 4,
            title: "ALLEY NIGHT vol.12".into(),
            artists: vec!["MONO NO AWARE".into(), "カネコアヤノ".into(), "羊文学".into()],
            price: "前売 ¥2,500 / 当日 ¥3,000 (1D別)".into(),
            price_english: "Reservation ¥2,500 / Door ¥3,000 (1 Drink purchase required)"
                .into(),
            open_time: jst(2024, 6, 14, 18, 30),
            start_time: jst(2024, 6, 14, 19, 0),
            url: "https://shimokitazawa-alley.com/schedule/202406/".into(),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Month-templated schedule URLs; no structured time or price markup, so
/// open/start and the price are mined out of the free-text detail block.
pub fn koenji_pulse() -> Simple {
    Simple {
        base_url: "https://koenji-pulse.com".into(),
        month_iterable_url: "https://koenji-pulse.com/schedule/{yyyy}/{mm}".into(),
        live_selector: "section.event".into(),
        title_querier: Some(Querier::new("h2.event-title")),
        artists_querier: Some(Querier::new("p.acts").split("／")),
        detail_querier: Some(Querier::new("div.detail")),
        time_handler: TimeHandler {
            year: Some(Querier::new("h1.sched-head")),
            month: Some(Querier::new("span.day").before("月")),
            day: Some(Querier::new("span.day").after("月")),
            is_month_in_live: true,
            ..Default::default()
        },
        prefecture_name: "tokyo".into(),
        area_name: "koenji".into(),
        venue_id: "koenji-pulse".into(),
        latitude: 35.705,
        longitude: 139.649,
        expected: ExpectedFirstLive {
            live_count: 2,
            title: "PULSE PRESENTS 真夏の前夜".into(),
            artists: vec!["THE GUAYS".into(), "DYGL".into(), "No Buses".into()],
            price: "前売¥2,800、当日¥3,300 (+1D)".into(),
            price_english: "Reservation¥2,800、Door¥3,300 (+1D)".into(),
            open_time: jst(2024, 7, 5, 18, 0),
            start_time: jst(2024, 7, 5, 18, 30),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Overview page of links only; everything else lives on per-show detail
/// pages, fetched through the worker pool.
pub fn shibuya_quarter() -> Simple {
    Simple {
        base_url: "https://shibuya-quarter.com".into(),
        initial_url: "https://shibuya-quarter.com/schedule".into(),
        live_selector: "li.live-item".into(),
        expanded_live_selector: "a.live-link".into(),
        details_link_selector: "a.ticket".into(),
        title_querier: Some(Querier::new("h1.name")),
        artists_querier: Some(Querier::all("ul.lineup li")),
        price_querier: Some(Querier::new("dd.adv").prefix("ADV ")),
        time_handler: TimeHandler {
            year: Some(Querier::new("p.date").before(".")),
            month: Some(Querier::new("p.date").split_index(".", 1)),
            day: Some(Querier::new("p.date").split_index(".", 2)),
            open_time: Some(Querier::new("dd.open")),
            start_time: Some(Querier::new("dd.start")),
            is_year_in_live: true,
            is_month_in_live: true,
        },
        prefecture_name: "tokyo".into(),
        area_name: "shibuya".into(),
        venue_id: "shibuya-quarter".into(),
        latitude: 35.659,
        longitude: 139.698,
        expected: ExpectedFirstLive {
            live_count: 2,
            title: "QUARTER presents「真夜中の温度」".into(),
            artists: vec!["downt".into(), "紫 今".into()],
            price: "ADV ¥3,000 (+1D)".into(),
            price_english: "ADV ¥3,000 (+1D)".into(),
            open_time: jst(2024, 8, 2, 18, 0),
            start_time: jst(2024, 8, 2, 18, 30),
            url: "https://t.example.com/q0802".into(),
            ..Default::default()
        },
        ..Default::default()
    }
}
