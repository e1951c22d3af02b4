//! Batch synchronization between a sheet and the portal
//!
//! Rows are processed strictly top to bottom with at most one portal call
//! each. A row failure is recorded in that row's response columns and the
//! batch moves on; only precondition failures abort, and always before the
//! first call.

use log::{debug, info, warn};
use serde_json::Value;

use crate::api::{Operation, Portal, PortalResponse, Profile};
use crate::sheet::{
    HEADER_COMMENTED_PROP_RESPONSE, HEADER_COMMENTED_PROP_RESPONSE_TIME, HEADER_ROW, Sheet,
    apply_profile, make_template,
};

use super::error::SyncError;
use super::mapper::{RowObject, identifying_key, identifying_subset, object_to_row, row_to_object};
use super::outcome::{BatchReport, RowOutcome};
use super::selector::{SelectedColumn, restrict_to_selected};
use super::validate::{RowValidation, check_properties, validate_object};

/// Response cells stay below the xlsx per-cell limit
const MAX_RESPONSE_CHARS: usize = 32_000;

/// Write method for [`submit_sheet_to_portal`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMethod {
    /// Replace existing objects
    Put,
    /// Create new objects
    Post,
    /// Partially update existing objects
    Patch,
}

impl SubmitMethod {
    pub fn http_method(&self) -> &'static str {
        match self {
            SubmitMethod::Put => "PUT",
            SubmitMethod::Post => "POST",
            SubmitMethod::Patch => "PATCH",
        }
    }

    /// PUT and PATCH must resolve an existing object
    pub fn requires_identifying_key(&self) -> bool {
        !matches!(self, SubmitMethod::Post)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Leave hidden rows out of the batch
    pub ignore_hidden_rows: bool,
    /// Write admin-only properties back on GET
    pub for_admin: bool,
    /// Run local validation before each write and fail invalid rows without a call
    pub validate_first: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            ignore_hidden_rows: true,
            for_admin: false,
            validate_first: false,
        }
    }
}

/// Resolved per-batch state, computed before the first call
struct Batch {
    rows: Vec<usize>,
    response_col: usize,
    time_col: usize,
}

fn prepare_batch(
    sheet: &mut Sheet,
    profile: &Profile,
    needs_identifying_column: bool,
    options: BatchOptions,
) -> Result<Batch, SyncError> {
    let rows = sheet.data_rows(options.ignore_hidden_rows);
    if rows.is_empty() {
        return Err(SyncError::NoDataRows(sheet.name().to_string()));
    }

    if needs_identifying_column
        && !profile
            .identifying_properties()
            .iter()
            .any(|prop| sheet.find_column_by_header(prop).is_some())
    {
        return Err(SyncError::NoIdentifyingColumn(
            profile.identifying_properties().join(", "),
        ));
    }

    let response_col = sheet.ensure_control_column(HEADER_COMMENTED_PROP_RESPONSE);
    let time_col = sheet.ensure_control_column(HEADER_COMMENTED_PROP_RESPONSE_TIME);

    Ok(Batch {
        rows,
        response_col,
        time_col,
    })
}

fn truncate_chars(text: String, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text,
    }
}

/// Response cell text: `{METHOD} {status} {message}` then the compact body
fn response_text(method: &str, outcome: &RowOutcome, body: Option<&Value>) -> String {
    let mut text = match outcome.status {
        Some(status) => format!("{} {} {}", method, status, outcome.message),
        None => format!("{} {}", method, outcome.message),
    };
    if let Some(body) = body {
        text.push('\n');
        text.push_str(&body.to_string());
    }
    truncate_chars(text, MAX_RESPONSE_CHARS)
}

fn record_outcome(
    sheet: &mut Sheet,
    batch: &Batch,
    method: &str,
    outcome: &RowOutcome,
    body: Option<&Value>,
) {
    sheet.set_cell(
        outcome.row,
        batch.response_col,
        response_text(method, outcome, body),
    );
    sheet.set_cell(outcome.row, batch.time_col, outcome.timestamp.to_rfc3339());
}

/// Classify a portal reply for a row
fn classify(row: usize, response: &PortalResponse) -> Result<RowOutcome, SyncError> {
    if response.is_success() {
        Ok(RowOutcome::succeeded(row, response.status, response.short_message()))
    } else if response.is_not_found() {
        Err(SyncError::RemoteNotFound)
    } else {
        Err(SyncError::Remote {
            status: response.status,
            message: response.short_message(),
        })
    }
}

async fn call(portal: &dyn Portal, operation: &Operation) -> Result<PortalResponse, SyncError> {
    portal
        .execute(operation)
        .await
        .map_err(|e| SyncError::Transport(format!("{:#}", e)))
}

/// Fill rows with the portal's current objects (GET)
pub async fn update_sheet_from_portal(
    sheet: &mut Sheet,
    profile: &Profile,
    portal: &dyn Portal,
    options: BatchOptions,
) -> Result<BatchReport, SyncError> {
    let batch = prepare_batch(sheet, profile, true, options)?;
    let mut report = BatchReport::new("GET");
    info!(
        "GET {} row(s) of '{}' from {}",
        batch.rows.len(),
        sheet.name(),
        portal.endpoint()
    );

    for &row in &batch.rows {
        if sheet.is_row_skipped(row) {
            debug!("Row {}: skipped", row);
            report.push(RowOutcome::skipped(row));
            continue;
        }

        let object = row_to_object(sheet, row, profile, false);
        let (outcome, body) = match fetch_row(sheet, row, &object, profile, portal, options).await {
            Ok((outcome, response)) => (outcome, response.body),
            Err((error, body)) => {
                warn!("Row {}: GET failed: {}", row, error);
                (RowOutcome::failed(row, error), body)
            }
        };
        record_outcome(sheet, &batch, "GET", &outcome, body.as_ref());
        report.push(outcome);
    }

    info!(
        "GET finished: {} succeeded, {} failed, {} skipped",
        report.succeeded(),
        report.failed(),
        report.skipped()
    );
    Ok(report)
}

type RowResult = Result<(RowOutcome, PortalResponse), (SyncError, Option<Value>)>;

async fn fetch_row(
    sheet: &mut Sheet,
    row: usize,
    object: &RowObject,
    profile: &Profile,
    portal: &dyn Portal,
    options: BatchOptions,
) -> RowResult {
    let (prop, id) =
        identifying_key(object, profile).ok_or((SyncError::IdentifyingKeyMissing, None))?;
    debug!("Row {}: fetching by {} = {}", row, prop, id);

    let response = call(portal, &Operation::fetch(id))
        .await
        .map_err(|e| (e, None))?;
    let outcome = classify(row, &response).map_err(|e| (e, response.body.clone()))?;

    if let Some(remote) = response.object() {
        let written = object_to_row(sheet, row, remote, profile, options.for_admin);
        debug!("Row {}: wrote {} cell(s)", row, written);
    }
    Ok((outcome, response))
}

/// Rebuild `source` under the current profile as a new sheet called `name`.
///
/// The new sheet gets the profile's template header plus every identifying
/// column found in the source, one row per eligible source row with an
/// identifying value (carrying only those values), and is then filled by GET.
/// `source` itself is never modified.
pub async fn rebuild_sheet_from_portal(
    source: &Sheet,
    name: &str,
    profile: &Profile,
    portal: &dyn Portal,
    options: BatchOptions,
) -> Result<(Sheet, BatchReport), SyncError> {
    let id_cols: Vec<(&str, usize)> = profile
        .identifying_properties()
        .iter()
        .filter_map(|prop| source.find_column_by_header(prop).map(|col| (prop.as_str(), col)))
        .collect();
    if id_cols.is_empty() {
        return Err(SyncError::NoIdentifyingColumn(
            profile.identifying_properties().join(", "),
        ));
    }

    let eligible: Vec<usize> = source
        .data_rows(options.ignore_hidden_rows)
        .into_iter()
        .filter(|&row| !source.is_row_skipped(row))
        .collect();
    let rows: Vec<usize> = eligible
        .iter()
        .copied()
        .filter(|&row| id_cols.iter().any(|&(_, col)| !source.cell(row, col).trim().is_empty()))
        .collect();
    if rows.is_empty() {
        return Err(SyncError::NoDataRows(source.name().to_string()));
    }
    if rows.len() < eligible.len() {
        warn!(
            "{} row(s) of '{}' have no identifying value and are left out of '{}'",
            eligible.len() - rows.len(),
            source.name(),
            name
        );
    }

    let mut sheet = Sheet::new(name);
    make_template(&mut sheet, profile, options.for_admin);
    let mut targets = Vec::with_capacity(id_cols.len());
    for &(prop, src_col) in &id_cols {
        // Identifying columns stay even when the template leaves them out
        let dst_col = match sheet.find_column_by_header(prop) {
            Some(col) => col,
            None => sheet.append_header(prop),
        };
        targets.push((src_col, dst_col));
    }
    for (i, &row) in rows.iter().enumerate() {
        for &(src_col, dst_col) in &targets {
            sheet.set_cell(HEADER_ROW + 1 + i, dst_col, source.cell(row, src_col));
        }
    }
    info!(
        "Rebuilding '{}' as '{}' with {} row(s)",
        source.name(),
        name,
        rows.len()
    );

    let fill = BatchOptions {
        ignore_hidden_rows: false,
        ..options
    };
    let report = update_sheet_from_portal(&mut sheet, profile, portal, fill).await?;
    apply_profile(&mut sheet, profile);
    Ok((sheet, report))
}

/// Submit rows to the portal with PUT, POST or PATCH.
///
/// `selected` restricts a PATCH payload to those columns (plus every
/// populated identifying property); it is rejected for other methods.
pub async fn submit_sheet_to_portal(
    sheet: &mut Sheet,
    profile: &Profile,
    portal: &dyn Portal,
    method: SubmitMethod,
    selected: Option<&[SelectedColumn]>,
    options: BatchOptions,
) -> Result<BatchReport, SyncError> {
    match selected {
        Some(_) if method != SubmitMethod::Patch => {
            return Err(SyncError::Configuration(format!(
                "column selection only applies to PATCH, not {}",
                method.http_method()
            )));
        }
        Some([]) => return Err(SyncError::NoSelectedColumns),
        _ => {}
    }

    let batch = prepare_batch(sheet, profile, method.requires_identifying_key(), options)?;
    let http_method = method.http_method();
    let mut report = BatchReport::new(http_method);
    info!(
        "{} {} row(s) of '{}' to {}",
        http_method,
        batch.rows.len(),
        sheet.name(),
        portal.endpoint()
    );

    for &row in &batch.rows {
        if sheet.is_row_skipped(row) {
            debug!("Row {}: skipped", row);
            report.push(RowOutcome::skipped(row));
            continue;
        }

        let object = row_to_object(sheet, row, profile, false);
        let payload = match selected {
            Some(columns) => restrict_to_selected(&object, columns, profile),
            None => object,
        };

        let result = submit_row(sheet, row, payload, profile, portal, method, options).await;
        let (outcome, body) = match result {
            Ok((outcome, response)) => (outcome, response.body),
            Err((error, body)) => {
                warn!("Row {}: {} failed: {}", row, http_method, error);
                (RowOutcome::failed(row, error), body)
            }
        };
        record_outcome(sheet, &batch, http_method, &outcome, body.as_ref());
        report.push(outcome);
    }

    info!(
        "{} finished: {} succeeded, {} failed, {} skipped",
        http_method,
        report.succeeded(),
        report.failed(),
        report.skipped()
    );
    Ok(report)
}

async fn submit_row(
    sheet: &mut Sheet,
    row: usize,
    payload: RowObject,
    profile: &Profile,
    portal: &dyn Portal,
    method: SubmitMethod,
    options: BatchOptions,
) -> RowResult {
    if options.validate_first {
        let issues = match method {
            SubmitMethod::Patch => check_properties(&payload, profile),
            SubmitMethod::Put | SubmitMethod::Post => validate_object(&payload, profile),
        };
        if let Some(error) = (RowValidation { row, issues }).error() {
            return Err((error, None));
        }
    }

    let key = identifying_key(&payload, profile);
    let data = Value::Object(payload);
    let operation = match (method, key) {
        (SubmitMethod::Post, _) => Operation::create(profile.name.clone(), data),
        (_, None) => return Err((SyncError::IdentifyingKeyMissing, None)),
        (SubmitMethod::Put, Some((_, id))) => Operation::replace(id, data),
        (SubmitMethod::Patch, Some((_, id))) => Operation::update(id, data),
    };

    let response = call(portal, &operation).await.map_err(|e| (e, None))?;
    let outcome = classify(row, &response).map_err(|e| (e, response.body.clone()))?;

    if method == SubmitMethod::Post {
        write_back_identifiers(sheet, row, &response, profile);
    }
    Ok((outcome, response))
}

/// Write identifiers assigned by a POST into the row's empty identifying cells
fn write_back_identifiers(sheet: &mut Sheet, row: usize, response: &PortalResponse, profile: &Profile) {
    let Some(remote) = response.object() else {
        return;
    };
    let assigned: RowObject = identifying_subset(remote, profile)
        .into_iter()
        .filter(|(prop, _)| {
            sheet
                .find_column_by_header(prop)
                .is_some_and(|col| sheet.cell(row, col).trim().is_empty())
        })
        .collect();
    if assigned.is_empty() {
        return;
    }
    let written = object_to_row(sheet, row, &assigned, profile, true);
    debug!("Row {}: wrote back {} identifier(s)", row, written);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::profile::models::fixtures::sample_profile;
    use crate::sheet::columns::HEADER_COMMENTED_PROP_SKIP;
    use crate::sheet::is_commented;
    use crate::sync::outcome::RowState;
    use crate::sync::selector::{ColumnSelection, get_selected_columns};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    type Responder = Box<dyn Fn(&Operation) -> anyhow::Result<PortalResponse> + Send + Sync>;

    /// Records every operation and answers from a closure
    struct MockPortal {
        calls: Mutex<Vec<Operation>>,
        respond: Responder,
    }

    impl MockPortal {
        fn new(
            respond: impl Fn(&Operation) -> anyhow::Result<PortalResponse> + Send + Sync + 'static,
        ) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                respond: Box::new(respond),
            }
        }

        fn ok(body: Value) -> Self {
            Self::new(move |_| Ok(PortalResponse::new(200, Some(body.clone()))))
        }

        fn calls(&self) -> Vec<Operation> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Portal for MockPortal {
        fn endpoint(&self) -> &str {
            "https://portal.test"
        }

        async fn execute(&self, operation: &Operation) -> anyhow::Result<PortalResponse> {
            self.calls.lock().unwrap().push(operation.clone());
            (self.respond)(operation)
        }
    }

    /// accession / status / #skip with rows A (skipped), B (no accession), C
    fn scenario_sheet() -> Sheet {
        Sheet::from_rows(
            "samples",
            vec![
                vec!["accession", "status", HEADER_COMMENTED_PROP_SKIP],
                vec!["XA", "released", "1"],
                vec!["", "released", ""],
                vec!["XC", "released", ""],
            ],
        )
    }

    fn not_found_for_xc(operation: &Operation) -> anyhow::Result<PortalResponse> {
        match operation {
            Operation::Fetch { id } | Operation::Replace { id, .. } | Operation::Update { id, .. }
                if id == "XC" =>
            {
                Ok(PortalResponse::new(404, Some(json!({"title": "Not Found"}))))
            }
            _ => Ok(PortalResponse::new(200, Some(json!({"@graph": []})))),
        }
    }

    fn response_cell(sheet: &Sheet, row: usize) -> &str {
        let col = sheet
            .find_control_column(HEADER_COMMENTED_PROP_RESPONSE)
            .unwrap();
        sheet.cell(row, col)
    }

    #[tokio::test]
    async fn test_put_scenario_rows_fail_independently() {
        for method in [SubmitMethod::Put, SubmitMethod::Patch] {
            let profile = sample_profile();
            let mut sheet = scenario_sheet();
            let portal = MockPortal::new(not_found_for_xc);

            let report = submit_sheet_to_portal(
                &mut sheet,
                &profile,
                &portal,
                method,
                None,
                BatchOptions::default(),
            )
            .await
            .unwrap();

            // Row A: skipped, no status written
            assert_eq!(report.outcome(2).unwrap().state, RowState::Skipped);
            assert_eq!(response_cell(&sheet, 2), "");

            // Row B: no identifying property, no call
            assert_eq!(
                report.outcome(3).unwrap().state,
                RowState::Failed(SyncError::IdentifyingKeyMissing)
            );
            assert!(response_cell(&sheet, 3).contains("no identifying property"));

            // Row C: exactly one call, 404 recorded
            assert_eq!(
                report.outcome(4).unwrap().state,
                RowState::Failed(SyncError::RemoteNotFound)
            );
            assert!(response_cell(&sheet, 4).starts_with(&format!("{} 404", method.http_method())));

            assert_eq!(portal.calls().len(), 1);
            assert_eq!(report.succeeded(), 0);
            assert_eq!(report.failed(), 2);
        }
    }

    #[tokio::test]
    async fn test_batch_continues_after_failure() {
        let profile = sample_profile();
        let mut sheet = Sheet::from_rows(
            "s",
            vec![
                vec!["accession", "status"],
                vec!["XC", "released"],
                vec!["XD", "released"],
            ],
        );
        let portal = MockPortal::new(not_found_for_xc);

        let report = submit_sheet_to_portal(
            &mut sheet,
            &profile,
            &portal,
            SubmitMethod::Put,
            None,
            BatchOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(report.failed(), 1);
        assert_eq!(report.succeeded(), 1);
        let ids: Vec<String> = portal
            .calls()
            .iter()
            .map(|op| op.path())
            .collect();
        assert_eq!(ids, vec!["XC/", "XD/"]);
    }

    #[tokio::test]
    async fn test_skipped_rows_are_never_called() {
        let profile = sample_profile();
        let mut sheet = Sheet::from_rows(
            "s",
            vec![
                vec!["#skip", "accession"],
                vec!["1", "X1"],
                vec!["true", "X2"],
            ],
        );
        let portal = MockPortal::ok(json!({}));

        for method in [SubmitMethod::Put, SubmitMethod::Post, SubmitMethod::Patch] {
            let report = submit_sheet_to_portal(
                &mut sheet,
                &profile,
                &portal,
                method,
                None,
                BatchOptions::default(),
            )
            .await
            .unwrap();
            assert_eq!(report.skipped(), 2);
        }
        update_sheet_from_portal(&mut sheet, &profile, &portal, BatchOptions::default())
            .await
            .unwrap();

        assert!(portal.calls().is_empty());
    }

    #[tokio::test]
    async fn test_post_writes_back_assigned_identifier_only() {
        let profile = sample_profile();
        let mut sheet = Sheet::from_rows(
            "s",
            vec![
                vec!["accession", "status", "lab"],
                vec!["", "released", "/labs/a/"],
            ],
        );
        let before = sheet.clone();
        let portal = MockPortal::ok(json!({
            "@graph": [{"accession": "X123", "status": "in progress", "lab": "/labs/b/"}]
        }));

        let report = submit_sheet_to_portal(
            &mut sheet,
            &profile,
            &portal,
            SubmitMethod::Post,
            None,
            BatchOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(report.succeeded(), 1);
        assert_eq!(sheet.cell(2, 1), "X123");
        for col in 2..=before.last_column() {
            assert_eq!(sheet.cell(2, col), before.cell(2, col));
        }
        assert_eq!(
            portal.calls(),
            vec![Operation::create(
                "sample",
                json!({"status": "released", "lab": "/labs/a/"})
            )]
        );
        assert!(response_cell(&sheet, 2).starts_with("POST 200 success\n"));
    }

    #[tokio::test]
    async fn test_patch_selected_keeps_identifying_properties() {
        let profile = sample_profile();
        let mut sheet = Sheet::from_rows(
            "s",
            vec![
                vec!["accession", "aliases", "status", "lab", "#response"],
                vec!["X1", "lab:a", "released", "/labs/a/", "old"],
                vec!["", "lab:b", "deleted", "/labs/b/", ""],
            ],
        );
        let selection = ColumnSelection::from_columns([3]);
        let selected = get_selected_columns(&sheet, &selection, false);
        let portal = MockPortal::ok(json!({}));

        let report = submit_sheet_to_portal(
            &mut sheet,
            &profile,
            &portal,
            SubmitMethod::Patch,
            Some(selected.as_slice()),
            BatchOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(report.succeeded(), 2);
        assert_eq!(
            portal.calls(),
            vec![
                Operation::update(
                    "X1",
                    json!({"accession": "X1", "aliases": ["lab:a"], "status": "released"})
                ),
                Operation::update("lab:b", json!({"aliases": ["lab:b"], "status": "deleted"})),
            ]
        );
    }

    #[tokio::test]
    async fn test_payloads_never_contain_control_columns() {
        let profile = sample_profile();
        let mut sheet = Sheet::from_rows(
            "s",
            vec![
                vec!["#skip", "accession", "status", "#response", "#response_time", "#note"],
                vec!["0", "X1", "released", "PUT 200", "yesterday", "hello"],
            ],
        );
        let portal = MockPortal::ok(json!({}));

        for method in [SubmitMethod::Put, SubmitMethod::Post, SubmitMethod::Patch] {
            submit_sheet_to_portal(
                &mut sheet,
                &profile,
                &portal,
                method,
                None,
                BatchOptions::default(),
            )
            .await
            .unwrap();
        }

        let calls = portal.calls();
        assert_eq!(calls.len(), 3);
        for call in calls {
            let payload = call.payload().and_then(Value::as_object).unwrap();
            assert!(payload.keys().all(|k| !is_commented(k)), "{:?}", payload);
        }
    }

    #[tokio::test]
    async fn test_get_fills_row_and_respects_admin() {
        let profile = sample_profile();
        let mut sheet = Sheet::from_rows(
            "s",
            vec![
                vec!["accession", "status", "quality", "notes"],
                vec!["X1", "", "", "keep me"],
            ],
        );
        let portal = MockPortal::ok(json!({
            "accession": "X1",
            "status": "released",
            "quality": "good",
            "aliases": ["lab:a"]
        }));

        let report = update_sheet_from_portal(&mut sheet, &profile, &portal, BatchOptions::default())
            .await
            .unwrap();
        assert_eq!(report.succeeded(), 1);
        assert_eq!(sheet.cell(2, 2), "released");
        assert_eq!(sheet.cell(2, 3), "");
        assert_eq!(sheet.cell(2, 4), "keep me");
        assert_eq!(portal.calls(), vec![Operation::fetch("X1")]);

        let admin = BatchOptions {
            for_admin: true,
            ..BatchOptions::default()
        };
        update_sheet_from_portal(&mut sheet, &profile, &portal, admin)
            .await
            .unwrap();
        assert_eq!(sheet.cell(2, 3), "good");
    }

    #[tokio::test]
    async fn test_headers_with_other_case_and_spacing() {
        let profile = sample_profile();
        let mut sheet = Sheet::from_rows(
            "s",
            vec![vec!["Accession", " status ", "Lab"], vec!["X1", "", ""]],
        );
        let portal = MockPortal::ok(json!({"accession": "X1", "status": "released", "lab": "/labs/a/"}));

        let report = update_sheet_from_portal(&mut sheet, &profile, &portal, BatchOptions::default())
            .await
            .unwrap();

        assert_eq!(report.succeeded(), 1);
        assert_eq!(portal.calls(), vec![Operation::fetch("X1")]);
        assert_eq!(sheet.cell(2, 2), "released");
        assert_eq!(sheet.cell(2, 3), "/labs/a/");

        let selected = get_selected_columns(&sheet, &ColumnSelection::from_columns([2]), false);
        let portal = MockPortal::ok(json!({}));
        submit_sheet_to_portal(
            &mut sheet,
            &profile,
            &portal,
            SubmitMethod::Patch,
            Some(selected.as_slice()),
            BatchOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(
            portal.calls(),
            vec![Operation::update("X1", json!({"accession": "X1", "status": "released"}))]
        );
    }

    #[tokio::test]
    async fn test_post_writes_back_into_loosely_named_column() {
        let profile = sample_profile();
        let mut sheet = Sheet::from_rows(
            "s",
            vec![vec!["ACCESSION", "Status"], vec!["", "released"]],
        );
        let portal = MockPortal::ok(json!({"@graph": [{"accession": "X123", "status": "released"}]}));

        let report = submit_sheet_to_portal(
            &mut sheet,
            &profile,
            &portal,
            SubmitMethod::Post,
            None,
            BatchOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(report.succeeded(), 1);
        assert_eq!(
            portal.calls(),
            vec![Operation::create("sample", json!({"status": "released"}))]
        );
        assert_eq!(sheet.cell(2, 1), "X123");
    }

    #[tokio::test]
    async fn test_rebuild_sheet_keeps_source_and_fills_new_sheet() {
        let profile = sample_profile();
        let source = Sheet::from_rows(
            "samples",
            vec![
                vec!["status", "Accession", HEADER_COMMENTED_PROP_SKIP, "colour"],
                vec!["old", "X1", "", "red"],
                vec!["old", "X2", "1", ""],
                vec!["old", "", "", "blue"],
                vec!["old", "X3", "", ""],
            ],
        );
        let before = source.clone();
        let portal = MockPortal::new(|operation| match operation {
            Operation::Fetch { id } => Ok(PortalResponse::new(
                200,
                Some(json!({"accession": id, "status": "released", "lab": format!("/labs/{}/", id)})),
            )),
            other => anyhow::bail!("unexpected {:?}", other),
        });

        let (sheet, report) = rebuild_sheet_from_portal(
            &source,
            "samples (updated)",
            &profile,
            &portal,
            BatchOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(sheet.name(), "samples (updated)");
        assert_eq!(report.succeeded(), 2);
        assert_eq!(
            portal.calls(),
            vec![Operation::fetch("X1"), Operation::fetch("X3")]
        );

        let accession = sheet.find_column_by_header("accession").unwrap();
        let status = sheet.find_column_by_header("status").unwrap();
        let lab = sheet.find_column_by_header("lab").unwrap();
        assert_eq!(sheet.cell(2, accession), "X1");
        assert_eq!(sheet.cell(3, accession), "X3");
        assert_eq!(sheet.cell(3, status), "released");
        assert_eq!(sheet.cell(3, lab), "/labs/X3/");
        assert_eq!(sheet.data_rows(false), vec![2, 3]);
        // Columns outside the profile are not carried over
        assert!(sheet.find_column_by_header("colour").is_none());
        assert!(!sheet.header_styles().is_empty());

        assert_eq!(source.rows(), before.rows());
    }

    #[tokio::test]
    async fn test_rebuild_sheet_preconditions() {
        let profile = sample_profile();
        let portal = MockPortal::ok(json!({}));

        let no_id = Sheet::from_rows("s", vec![vec!["status"], vec!["released"]]);
        let err = rebuild_sheet_from_portal(&no_id, "n", &profile, &portal, BatchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::NoIdentifyingColumn(_)));

        let no_values = Sheet::from_rows("s", vec![vec!["accession", "status"], vec!["", "released"]]);
        let err = rebuild_sheet_from_portal(&no_values, "n", &profile, &portal, BatchOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, SyncError::NoDataRows("s".to_string()));

        assert!(portal.calls().is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_is_row_scoped() {
        let profile = sample_profile();
        let mut sheet = Sheet::from_rows(
            "s",
            vec![vec!["accession"], vec!["X1"], vec!["X2"]],
        );
        let portal = MockPortal::new(|op| match op {
            Operation::Fetch { id } if id == "X1" => Err(anyhow::anyhow!("connection refused")),
            _ => Ok(PortalResponse::new(403, Some(json!({"description": "Forbidden"})))),
        });

        let report = update_sheet_from_portal(&mut sheet, &profile, &portal, BatchOptions::default())
            .await
            .unwrap();

        assert_eq!(
            report.outcome(2).unwrap().state,
            RowState::Failed(SyncError::Transport("connection refused".into()))
        );
        assert_eq!(
            report.outcome(3).unwrap().state,
            RowState::Failed(SyncError::Remote {
                status: 403,
                message: "Forbidden".into()
            })
        );
        assert!(response_cell(&sheet, 3).starts_with("GET 403 Forbidden\n"));
    }

    #[tokio::test]
    async fn test_preconditions_abort_before_any_call() {
        let profile = sample_profile();
        let portal = MockPortal::ok(json!({}));

        let mut empty = Sheet::from_rows("empty", vec![vec!["accession", "status"]]);
        assert_eq!(
            update_sheet_from_portal(&mut empty, &profile, &portal, BatchOptions::default())
                .await
                .unwrap_err(),
            SyncError::NoDataRows("empty".into())
        );

        let mut no_ids = Sheet::from_rows("s", vec![vec!["status"], vec!["released"]]);
        let err = submit_sheet_to_portal(
            &mut no_ids,
            &profile,
            &portal,
            SubmitMethod::Put,
            None,
            BatchOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SyncError::NoIdentifyingColumn(_)));
        // Precondition failures leave the header alone
        assert_eq!(no_ids.last_column(), 1);

        // POST creates objects without identifiers
        let report = submit_sheet_to_portal(
            &mut no_ids,
            &profile,
            &portal,
            SubmitMethod::Post,
            None,
            BatchOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(report.succeeded(), 1);

        let nothing: Vec<SelectedColumn> = Vec::new();
        let err = submit_sheet_to_portal(
            &mut no_ids,
            &profile,
            &portal,
            SubmitMethod::Patch,
            Some(nothing.as_slice()),
            BatchOptions::default(),
        )
        .await
        .unwrap_err();
        assert_eq!(err, SyncError::NoSelectedColumns);

        assert_eq!(portal.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_validate_first_blocks_invalid_rows() {
        let profile = sample_profile();
        let mut sheet = Sheet::from_rows(
            "s",
            vec![
                vec!["accession", "status", "read_count"],
                vec!["X1", "", "5"],
                vec!["X2", "released", "many"],
                vec!["X3", "released", "7"],
            ],
        );
        let portal = MockPortal::ok(json!({}));
        let options = BatchOptions {
            validate_first: true,
            ..BatchOptions::default()
        };

        let report = submit_sheet_to_portal(&mut sheet, &profile, &portal, SubmitMethod::Put, None, options)
            .await
            .unwrap();
        assert_eq!(report.failed(), 2);
        assert_eq!(portal.calls().len(), 1);

        // Missing required properties are fine for a partial update
        let report = submit_sheet_to_portal(&mut sheet, &profile, &portal, SubmitMethod::Patch, None, options)
            .await
            .unwrap();
        assert_eq!(report.failed(), 1);
        assert_eq!(portal.calls().len(), 3);
    }

    #[test]
    fn test_response_text_is_truncated() {
        let outcome = RowOutcome::succeeded(2, 200, "success");
        let body = json!({"big": "x".repeat(40_000)});
        let text = response_text("PUT", &outcome, Some(&body));
        assert_eq!(text.chars().count(), MAX_RESPONSE_CHARS);
        assert!(text.starts_with("PUT 200 success\n{\"big\""));
    }
}
