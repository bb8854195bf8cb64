use crate::calendar::{self, calendar_days, date_key, month_name, parse_date_key};
use crate::editor::DayEditor;
use crate::errors::AppError;
use crate::images::{UploadedImage, process_batch};
use crate::models::{
    CalendarDay, CalendarResponse, Color, ColorRequest, DayResponse, EntriesMap, EntryData,
    ImagesResponse, LogTextRequest, MonthQuery, MonthSummary, SummaryRequest, WeightRequest,
};
use crate::state::AppState;
use crate::storage::persist_entries;
use crate::summary::{self, SummaryError};
use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
};
use chrono::{Datelike, Local, NaiveDate};
use tracing::info;

pub async fn get_entries(State(state): State<AppState>) -> Json<EntriesMap> {
    let entries = state.entries.lock().await;
    Json(entries.clone())
}

pub async fn get_calendar(
    Query(query): Query<MonthQuery>,
) -> Result<Json<CalendarResponse>, AppError> {
    let today = today();
    let (year, month) = resolve_month(query.year, query.month, today)?;
    let days = calendar_days(year, month)
        .ok_or_else(|| AppError::bad_request("month out of range"))?
        .into_iter()
        .map(|date| CalendarDay {
            date: date_key(date),
            in_month: date.year() == year && calendar::month_index(date) == month,
            is_today: date == today,
        })
        .collect();

    Ok(Json(CalendarResponse {
        year,
        month,
        month_name: month_name(month).unwrap_or_default(),
        days,
    }))
}

pub async fn get_day(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<DayResponse>, AppError> {
    let key = parse_key(&date)?;
    let entries = state.entries.lock().await;
    Ok(Json(DayResponse {
        entry: entries.get(&key).cloned().unwrap_or_default(),
        persisted: false,
        uploading: state.uploads.is_pending(&key),
        date: key,
    }))
}

pub async fn add_log(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Json(payload): Json<LogTextRequest>,
) -> Result<Json<DayResponse>, AppError> {
    let key = parse_key(&date)?;
    let day = apply_edit(&state, &key, |editor| Ok(Some(editor.add_log(&payload.text)?))).await?;
    Ok(Json(day))
}

pub async fn edit_log(
    State(state): State<AppState>,
    Path((date, id)): Path<(String, String)>,
    Json(payload): Json<LogTextRequest>,
) -> Result<Json<DayResponse>, AppError> {
    let key = parse_key(&date)?;
    let day = apply_edit(&state, &key, |editor| {
        Ok(Some(editor.edit_log(&id, &payload.text)?))
    })
    .await?;
    Ok(Json(day))
}

pub async fn delete_log(
    State(state): State<AppState>,
    Path((date, id)): Path<(String, String)>,
) -> Result<Json<DayResponse>, AppError> {
    let key = parse_key(&date)?;
    let day = apply_edit(&state, &key, |editor| Ok(editor.delete_log(&id))).await?;
    Ok(Json(day))
}

pub async fn set_color(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Json(payload): Json<ColorRequest>,
) -> Result<Json<DayResponse>, AppError> {
    let key = parse_key(&date)?;
    let color = parse_color(&payload.color)?;
    let day = apply_edit(&state, &key, |editor| Ok(Some(editor.set_color(color)))).await?;
    Ok(Json(day))
}

/// Called when the weight field loses focus.
pub async fn set_weight(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Json(payload): Json<WeightRequest>,
) -> Result<Json<DayResponse>, AppError> {
    let key = parse_key(&date)?;
    let day = apply_edit(&state, &key, |editor| {
        editor.set_weight_draft(payload.weight);
        Ok(editor.blur_weight())
    })
    .await?;
    Ok(Json(day))
}

pub async fn add_images(
    State(state): State<AppState>,
    Path(date): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<ImagesResponse>, AppError> {
    let key = parse_key(&date)?;
    let files = read_images(&mut multipart).await?;
    if files.is_empty() {
        return Err(AppError::bad_request("no images provided"));
    }
    Ok(Json(upload_images(&state, &key, files).await?))
}

pub async fn delete_image(
    State(state): State<AppState>,
    Path((date, index)): Path<(String, usize)>,
) -> Result<Json<DayResponse>, AppError> {
    let key = parse_key(&date)?;
    let day = apply_edit(&state, &key, |editor| Ok(editor.remove_image(index))).await?;
    Ok(Json(day))
}

pub async fn summarize(
    State(state): State<AppState>,
    Json(payload): Json<SummaryRequest>,
) -> Result<Json<MonthSummary>, AppError> {
    let name = month_name(payload.month).ok_or_else(|| AppError::bad_request("month out of range"))?;
    let month_entries = {
        let entries = state.entries.lock().await;
        summary::month_entries(&entries, payload.year, payload.month)
    };
    if month_entries.is_empty() {
        return Err(SummaryError::NoEntries.into());
    }
    let client = state.summarizer.as_ref().ok_or(SummaryError::NotConfigured)?;

    info!(
        "summarizing {} days of {name} {}",
        month_entries.len(),
        payload.year
    );
    let summary = client.summarize(name, payload.year, &month_entries).await?;
    Ok(Json(summary))
}

/// Builds an editor from the latest stored entry, applies `edit`, and
/// persists the whole map when the edit emits a record. The lock is held for
/// the full read-modify-write so concurrent edits never overwrite each other.
pub(crate) async fn apply_edit<F>(
    state: &AppState,
    key: &str,
    edit: F,
) -> Result<DayResponse, AppError>
where
    F: FnOnce(&mut DayEditor) -> Result<Option<EntryData>, AppError>,
{
    let mut entries = state.entries.lock().await;
    let current = entries.get(key).cloned().unwrap_or_default();
    let mut editor = DayEditor::new(key, current);

    let persisted = match edit(&mut editor)? {
        Some(data) => {
            // Memory only changes once the file holds the new map.
            let mut next = entries.clone();
            next.insert(key.to_string(), data);
            persist_entries(&state.config.data_path, &next).await?;
            *entries = next;
            true
        }
        None => false,
    };

    Ok(DayResponse {
        date: key.to_string(),
        entry: entries.get(key).cloned().unwrap_or_default(),
        persisted,
        uploading: state.uploads.is_pending(key),
    })
}

/// Processes the batch outside the entries lock, then appends the results to
/// whatever the day holds by the time processing finishes.
pub(crate) async fn upload_images(
    state: &AppState,
    key: &str,
    files: Vec<UploadedImage>,
) -> Result<ImagesResponse, AppError> {
    let results = {
        let _pending = state.uploads.begin(key);
        process_batch(files, state.config.images).await
    };

    let mut failures = Vec::new();
    let day = apply_edit(state, key, |editor| {
        let outcome = editor.apply_image_batch(results);
        failures = outcome.failures;
        Ok(outcome.emitted)
    })
    .await?;

    Ok(ImagesResponse { day, failures })
}

pub(crate) async fn read_images(multipart: &mut Multipart) -> Result<Vec<UploadedImage>, AppError> {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let name = field.file_name().unwrap_or("image").to_string();
        let bytes = field.bytes().await?;
        // Browsers send an empty part when nothing was selected.
        if bytes.is_empty() {
            continue;
        }
        files.push(UploadedImage {
            name,
            bytes: bytes.to_vec(),
        });
    }
    Ok(files)
}

pub(crate) fn parse_key(date: &str) -> Result<String, AppError> {
    parse_date_key(date)
        .map(date_key)
        .ok_or_else(|| AppError::bad_request(format!("invalid date '{date}', expected YYYY-MM-DD")))
}

pub(crate) fn parse_color(id: &str) -> Result<Color, AppError> {
    id.trim()
        .parse()
        .map_err(|_| AppError::bad_request(format!("unknown color '{id}'")))
}

pub(crate) fn resolve_month(
    year: Option<i32>,
    month: Option<u32>,
    today: NaiveDate,
) -> Result<(i32, u32), AppError> {
    let year = year.unwrap_or(today.year());
    let month = month.unwrap_or(today.month0());
    if month > 11 {
        return Err(AppError::bad_request("month must be between 0 and 11"));
    }
    Ok((year, month))
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}
