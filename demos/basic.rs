use pagefetch::config::{Expiry, FetchOptionsPatch, Params};
use pagefetch::logging::init_tracing;
use pagefetch::prelude::*;
use serde_json::{Value, json};

const TOTAL_USERS: u64 = 23;
const PER_PAGE: u64 = 5;

/// Pretend backend: pages through a fixed list of users.
async fn list_users(params: Params) -> Result<Value, FetchError> {
    let page = params.get("page").and_then(Value::as_u64).unwrap_or(1).max(1);
    let total_pages = TOTAL_USERS.div_ceil(PER_PAGE);
    if page > total_pages {
        return Err(FetchError::new(format!("page {page} out of range"))
            .with_response(json!({"status": 404})));
    }

    let first = (page - 1) * PER_PAGE + 1;
    let last = (first + PER_PAGE - 1).min(TOTAL_USERS);
    let records: Vec<Value> = (first..=last)
        .map(|id| json!({"id": id, "name": format!("user-{id}")}))
        .collect();

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    Ok(json!({
        "records": records,
        "paginationInfo": {
            "currentPage": page,
            "totalPages": total_pages,
            "totalRecords": TOTAL_USERS,
            "currentRecords": last - first + 1,
            "itemsPerPage": PER_PAGE,
        }
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("pagefetch=debug,basic=info");

    let ctx = FetchContext::default();
    ctx.set_fetch_options(
        &FetchOptionsPatch::builder()
            .expires_after(Expiry::from_millis(60_000))
            .items_per_page(PER_PAGE)
            .build()?,
    );

    let users = FetchController::start(
        NamedFetcher::new("users", list_users),
        &FetchOptionsPatch::default(),
        &ctx,
    );

    let state = users.settled().await;
    tracing::info!(
        "page {}/{} with {} records",
        state.current_page,
        state.total_pages,
        state.records.len()
    );

    while !users.is_last_page() {
        users.load_more().await?;
        tracing::info!("loaded page {}", users.current_page());
    }

    // served from cache
    users.go_to_page(1).await?;

    if let Err(err) = users.go_to_page(99).await {
        tracing::warn!("expected failure: {} ({:?})", err, users.state().response);
    }

    let summary = SingleRequest::start(
        NamedFetcher::new("users.summary", |_: Params| async {
            Ok::<_, FetchError>(json!({"total": TOTAL_USERS}))
        }),
        None,
        &ctx,
    );
    tracing::info!("summary: {:?}", summary.settled().await.response);

    Ok(())
}
