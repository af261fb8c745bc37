//! End-to-end scrape runs against an in-memory site.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dedama::testing::{FakeBrowser, FakeSite};
use dedama::{
    analyze, DateEntry, GroupDataset, NavigatorConfig, ScrapeConfig, ScrapeCoordinator,
    ScrapeService, Store,
};

const ENTRY: &str = "https://hall.example/";
const LIST: &str = "https://hall.example/list";
const FALLBACK: &str = "https://other.example/";

fn row(id: u32, spins: u32, hits: u32) -> String {
    format!(
        "<tr><td>{id}</td><td>{spins}</td><td>1,000</td><td>{hits}</td><td>1</td><td>0</td>\
         <td>1/100.0</td><td>1/300.0</td><td>2,400</td><td>15</td></tr>"
    )
}

fn table(rows: &[String]) -> String {
    format!(
        "<table><tr><th>台番号</th><th>回転数</th><th>累計</th><th>総大当り</th><th>初当り</th>\
         <th>確変</th><th>確率</th><th>初当確率</th><th>最大</th><th>前日</th></tr>{}\
         <tr><td>平均</td><td>-</td><td>-</td><td>-</td><td>-</td><td>-</td><td>-</td><td>-</td>\
         <td>-</td><td>-</td></tr></table>",
        rows.concat()
    )
}

fn listing(models: &[(&str, &str)]) -> String {
    let items: String = models
        .iter()
        .map(|(href, name)| format!(r#"<li class="Pachinko"><a href="{href}">{name}</a></li>"#))
        .collect();
    format!(
        r#"<html><body id="SearchListPachinko"><div id="Prime-Column"><article>
           <section class="list1col"><ul class="m_list">{items}</ul></section>
           <a href="/">戻る</a></article></div></body></html>"#
    )
}

fn unit_page(self_href: &str, rows: &[String], dates: &[(&str, &str)]) -> String {
    let tabs: String = std::iter::once((self_href, "本日"))
        .chain(dates.iter().copied())
        .map(|(href, label)| format!(r#"<li><a href="{href}">{label}</a></li>"#))
        .collect();
    format!(
        r#"<html><body><div id="Prime-Column">
           <section class="dataDate"><ul>{tabs}</ul></section>
           {}</div></body></html>"#,
        table(rows)
    )
}

fn hall() -> FakeSite {
    FakeSite::new()
        .with_page(ENTRY, r#"<a href="/news">お知らせ</a><a href="/list">出玉情報</a>"#)
        .with_page(
            LIST,
            listing(&[("/kisyu/1", "Model One"), ("/kisyu/2", "Model Two"), ("/kisyu/3", "Model Three")]),
        )
        .with_page(
            "https://hall.example/kisyu/1",
            unit_page(
                "/kisyu/1",
                &[row(101, 300, 3), row(102, 500, 9)],
                &[("/kisyu/1?d=1", "1/14"), ("/kisyu/1?d=2", "昨日")],
            ),
        )
        .with_page(
            "https://hall.example/kisyu/1?d=1",
            unit_page("/kisyu/1", &[row(101, 200, 2)], &[]),
        )
        .with_page(
            "https://hall.example/kisyu/1?d=2",
            unit_page("/kisyu/1", &[row(102, 100, 1)], &[]),
        )
        .with_page("https://hall.example/kisyu/2", "<p>placeholder</p>")
        .with_failing_url("https://hall.example/kisyu/2")
        .with_page(
            "https://hall.example/kisyu/3",
            unit_page("/kisyu/3", &[row(201, 1000, 5)], &[]),
        )
}

fn config() -> ScrapeConfig {
    ScrapeConfig::new()
        .with_entry_url(ENTRY)
        .with_unit_delay(Duration::ZERO)
        .with_navigator(
            NavigatorConfig::default()
                .with_fallback_entry_points([FALLBACK])
                .with_today_label("2024/01/15"),
        )
}

fn service(site: FakeSite, config: ScrapeConfig) -> ScrapeService<FakeBrowser> {
    ScrapeService::new(
        ScrapeCoordinator::new(FakeBrowser::new(site), config),
        Arc::new(Store::new()),
    )
}

#[tokio::test]
async fn test_full_run_collects_groups_and_dates() {
    let site = hall();
    let coordinator = ScrapeCoordinator::new(FakeBrowser::new(site.clone()), config());

    let datasets = coordinator.run(ENTRY).await;

    let names: Vec<_> = datasets.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["Model One", "Model Three"]);

    let one = &datasets[0];
    assert_eq!(one.url, "https://hall.example/kisyu/1");
    let labels: Vec<_> = one.dates.iter().map(|d| d.date.as_str()).collect();
    assert_eq!(labels, ["2024/01/15", "1/14", "昨日"]);
    assert_eq!(one.dates[0].data.len(), 2);
    assert_eq!(one.dates[0].data[1].unit_id, "102");
    assert_eq!(one.dates[0].data[0].cumulative_starts, 1000);
    assert_eq!(one.dates[0].data[0].max_balls, 2400);
    assert_eq!(one.dates[0].data[0].hit_rate, "1/100.0");

    assert_eq!(site.open_count(), 1);
    assert_eq!(site.close_count(), 1);
    assert!(!site.navigations().contains(&FALLBACK.to_string()));
}

#[tokio::test]
async fn test_run_feeds_aggregation() {
    let datasets = ScrapeCoordinator::new(FakeBrowser::new(hall()), config())
        .run(ENTRY)
        .await;

    let stats = analyze(&datasets);
    let one = &stats["Model One"];

    assert_eq!(one.unit_count, 4);
    assert_eq!(one.total_hits, 15);
    assert_eq!(one.total_spins, 1100);
    assert_eq!(one.avg_hit_rate, 1.36);
    assert_eq!(one.units[0].unit_id, "102");
    assert_eq!(one.units[0].total_hits, 9);
}

#[tokio::test]
async fn test_failing_date_is_skipped() {
    let site = hall().with_failing_url("https://hall.example/kisyu/1?d=1");
    let datasets = ScrapeCoordinator::new(FakeBrowser::new(site), config())
        .run(ENTRY)
        .await;

    let labels: Vec<_> = datasets[0].dates.iter().map(|d| d.date.as_str()).collect();
    assert_eq!(labels, ["2024/01/15", "昨日"]);
}

#[tokio::test]
async fn test_max_groups_caps_visits() {
    let site = hall();
    let datasets = ScrapeCoordinator::new(FakeBrowser::new(site.clone()), config().with_max_groups(1))
        .run(ENTRY)
        .await;

    assert_eq!(datasets.len(), 1);
    let navigations = site.navigations();
    assert!(!navigations.iter().any(|u| u.ends_with("/kisyu/2")));
    assert!(!navigations.iter().any(|u| u.ends_with("/kisyu/3")));
}

#[tokio::test]
async fn test_fallback_entry_point_used_when_entry_is_empty() {
    let site = FakeSite::new()
        .with_page(ENTRY, r#"<a href="/about">About us</a>"#)
        .with_page(FALLBACK, r#"<ul><li class="Pachinko"><a href="/kisyu/7">Model Seven</a></li></ul>"#)
        .with_page(
            "https://other.example/kisyu/7",
            unit_page("/kisyu/7", &[row(7, 70, 7)], &[]),
        );

    let datasets = ScrapeCoordinator::new(FakeBrowser::new(site.clone()), config())
        .run(ENTRY)
        .await;

    assert_eq!(datasets.len(), 1);
    assert_eq!(datasets[0].name, "Model Seven");
    assert_eq!(site.navigations()[1], FALLBACK);
}

#[tokio::test]
async fn test_direct_tables_when_no_links() {
    let site = FakeSite::new().with_page(
        ENTRY,
        format!("<h2>Model Direct</h2>{}", table(&[row(5, 50, 1)])),
    );

    let datasets = ScrapeCoordinator::new(FakeBrowser::new(site), config())
        .run(ENTRY)
        .await;

    assert_eq!(datasets.len(), 1);
    assert_eq!(datasets[0].name, "Model Direct");
    assert_eq!(datasets[0].dates[0].date, "2024/01/15");
}

#[tokio::test]
async fn test_nothing_found_anywhere_keeps_store() {
    let site = FakeSite::new()
        .with_page(ENTRY, "<p>maintenance</p>")
        .with_page(FALLBACK, "<p>maintenance</p>");
    let service = service(site.clone(), config());

    let seeded_at = Utc::now() - chrono::Duration::days(1);
    let seeded = GroupDataset::new("Old", "https://hall.example/old", vec![DateEntry::new("d", vec![])]);
    service.store().begin_run().unwrap().commit(vec![seeded], seeded_at);

    let response = service.trigger_scrape().await;

    assert!(response.success);
    assert!(response.data.is_empty());
    assert_eq!(response.last_updated, Some(seeded_at));
    assert_eq!(service.cached_data().data[0].name, "Old");
    assert_eq!(site.navigations(), [ENTRY, FALLBACK]);
}

#[tokio::test]
async fn test_concurrent_trigger_returns_previous_timestamp() {
    let site = hall().with_navigate_delay(Duration::from_millis(20));
    let service = service(site.clone(), config());

    let seeded_at = Utc::now() - chrono::Duration::days(1);
    service.store().begin_run().unwrap().commit(Vec::new(), seeded_at);

    let (first, second) = tokio::join!(service.trigger_scrape(), async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(service.cached_data().scrape_in_progress);
        service.trigger_scrape().await
    });

    assert_eq!(second.last_updated, Some(seeded_at));
    assert!(second.data.is_empty());
    assert!(first.last_updated > Some(seeded_at));
    assert_eq!(first.data.len(), 2);
    assert_eq!(site.open_count(), 1);
    assert!(!service.cached_data().scrape_in_progress);
}

#[tokio::test]
async fn test_analysis_after_scrape() {
    let service = service(hall(), config());
    assert!(!service.analysis().success);

    service.trigger_scrape().await;

    let analysis = service.analysis();
    assert!(analysis.success);
    let stats = analysis.analysis.unwrap();
    assert_eq!(stats.keys().collect::<Vec<_>>(), ["Model One", "Model Three"]);

    let overview = service.overview();
    assert_eq!(overview.overview.unwrap().group_count, 2);
    assert_eq!(overview.top_units[0].unit.unit_id, "102");
}
