use anyhow::Result;
use billing_fetch::{
    write_report, BillingEngine, BillingError, FileBillingSource, FixedClock, HttpBillingSource,
    OutputFormat, Period, PeriodResolver, RunSettings, TableLayout, TomlConfig,
};
use chrono::NaiveDate;
use httpmock::prelude::*;
use tempfile::TempDir;

fn billing_page(rows: &[(u32, &str)]) -> String {
    let body: String = rows
        .iter()
        .map(|(month, amount)| {
            format!(
                "<tr><td>{}月</td><td>{}</td><td>{}</td></tr>\n",
                month, month, amount
            )
        })
        .collect();
    format!(
        r#"<html><body><div id="billing"><table><tbody>
<tr><th>請求月</th><th>ご使用日数</th><th>請求金額</th></tr>
{}</tbody></table></div></body></html>"#,
        body
    )
}

fn resolver() -> PeriodResolver<FixedClock> {
    PeriodResolver::new(FixedClock(NaiveDate::from_ymd_opt(2021, 2, 10).unwrap()))
}

#[tokio::test]
async fn test_default_window_over_http() -> Result<()> {
    let server = MockServer::start_async().await;
    let page_2021 = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/mypage")
                .query_param("claimYear", "2021")
                .header("Cookie", "session=abc");
            then.status(200)
                .header("Content-Type", "text/html; charset=utf-8")
                .body(billing_page(&[(2, "¥5,100"), (1, "¥6,200")]));
        })
        .await;
    let page_2020 = server
        .mock_async(|when, then| {
            when.method(GET).path("/mypage").query_param("claimYear", "2020");
            then.status(200)
                .body(billing_page(&[(12, "¥7,300"), (3, "¥4,000"), (2, "-")]));
        })
        .await;

    let config = TomlConfig::from_toml_str(&format!(
        r#"
[source]
type = "http"
endpoint = "{}"
headers = {{ Cookie = "session=abc" }}
"#,
        server.url("/mypage?claimYear={year}")
    ))?;
    let settings = RunSettings::from_toml(config)?;

    let periods = resolver().resolve(None)?;
    let engine = BillingEngine::new(settings.build_source()?, settings.layout.clone());
    let records = engine.run(&periods).await?;

    page_2021.assert_hits_async(1).await;
    page_2020.assert_hits_async(1).await;

    assert_eq!(records.len(), 12);
    assert_eq!(records[0].period, Period::new(2021, 2).unwrap());
    assert_eq!(records[0].amount, Some(5100));
    assert_eq!(records[1].amount, Some(6200));
    assert_eq!(records[2].period, Period::new(2020, 12).unwrap());
    assert_eq!(records[2].amount, Some(7300));
    assert_eq!(records[11].period, Period::new(2020, 3).unwrap());
    assert_eq!(records[11].amount, Some(4000));
    assert!(records[3..11].iter().all(|r| r.amount.is_none()));
    Ok(())
}

#[tokio::test]
async fn test_http_error_status_is_reported() -> Result<()> {
    let server = MockServer::start_async().await;
    let failing = server
        .mock_async(|when, then| {
            when.method(GET).path("/mypage/2020");
            then.status(500);
        })
        .await;

    let source = HttpBillingSource::new(server.url("/mypage/{year}"))?;
    let engine = BillingEngine::new(source, TableLayout::default());
    let periods = resolver().resolve(Some(&["2020-05".to_string()]))?;

    let err = engine.run(&periods).await.unwrap_err();
    failing.assert_async().await;
    assert!(matches!(err, BillingError::Source { .. }));
    assert_eq!(err.exit_code(), 2);
    Ok(())
}

#[tokio::test]
async fn test_snapshot_directory_to_csv_file() -> Result<()> {
    let snapshots = TempDir::new()?;
    std::fs::write(
        snapshots.path().join("billing_2020.html"),
        billing_page(&[(8, "¥7,123"), (4, "¥3,210")]),
    )?;

    let periods = resolver().resolve(Some(&["2020-08".to_string(), "2020-04".to_string()]))?;
    let engine = BillingEngine::new(
        FileBillingSource::new(snapshots.path()),
        TableLayout::default(),
    );
    let records = engine.run(&periods).await?;

    let out_dir = TempDir::new()?;
    let out_path = out_dir.path().join("reports").join("billing.csv");
    write_report(&records, OutputFormat::Csv, Some(&out_path))?;

    let written = std::fs::read_to_string(&out_path)?;
    assert_eq!(
        written,
        "period,year,month,amount\n2020-08,2020,8,7123\n2020-04,2020,4,3210\n"
    );
    Ok(())
}

#[tokio::test]
async fn test_custom_layout_from_config() -> Result<()> {
    let snapshots = TempDir::new()?;
    std::fs::write(
        snapshots.path().join("2020.html"),
        r#"<section class="history"><table>
<tr><th>Month</th><th>Amount due</th></tr>
<tr><td>2020/10</td><td>¥ 990</td></tr>
<tr><td>2020/11</td><td>¥ 1,050</td></tr>
</table></section>"#,
    )?;

    let config = TomlConfig::from_toml_str(&format!(
        r#"
[source]
type = "file"
directory = "{}"
file_pattern = "{{year}}.html"

[table]
selector = "section.history table"
amount_header = "Amount due"
month_label = "{{year}}/{{month}}"
"#,
        snapshots.path().display().to_string().replace('\\', "/")
    ))?;
    let settings = RunSettings::from_toml(config)?;
    let engine = BillingEngine::new(settings.build_source()?, settings.layout.clone());

    let periods = resolver().resolve(Some(&["2020-11".to_string()]))?;
    let records = engine.run(&periods).await?;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].amount, Some(1050));
    Ok(())
}

#[test]
fn test_invalid_token_is_a_usage_error() {
    let tokens = vec!["2020-08".to_string(), "2020-13".to_string()];
    let err = resolver().resolve(Some(&tokens)).unwrap_err();
    assert_eq!(
        BillingError::from(err.clone()).exit_code(),
        1,
        "validation errors are usage errors"
    );
    assert!(err.to_string().contains("2020-13"));
}
