//! Form-driven HTML routes. Every form posts, then redirects back to the month
//! that contains the edited day.

use crate::calendar::{calendar_days, date_key, parse_date_key};
use crate::editor::{ColorPicker, EditError, ImageViewer};
use crate::errors::AppError;
use crate::handlers::{
    apply_edit, parse_color, parse_key, read_images, resolve_month, today, upload_images,
};
use crate::models::{ColorRequest, LogTextRequest, WeightRequest};
use crate::state::AppState;
use crate::ui::{DayCell, MonthPage, month_url, render_month};
use axum::{
    Form,
    extract::{Multipart, Path, Query, State},
    response::{Html, Redirect},
};
use chrono::Datelike;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub picker: Option<String>,
    pub view: Option<String>,
    pub image: Option<usize>,
    pub notice: Option<String>,
}

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, AppError> {
    let today = today();
    let (year, month) = resolve_month(query.year, query.month, today)?;
    let days = calendar_days(year, month).ok_or_else(|| AppError::bad_request("month out of range"))?;

    let mut picker = ColorPicker::default();
    if let Some(key) = query.picker.as_deref() {
        picker.open(key);
    }

    let mut viewer = ImageViewer::default();
    let cells: Vec<DayCell> = {
        let entries = state.entries.lock().await;
        days.into_iter()
            .map(|date| {
                let key = date_key(date);
                let entry = entries.get(&key).cloned().unwrap_or_default();
                if query.view.as_deref() == Some(key.as_str()) {
                    viewer.show(key.clone(), query.image.unwrap_or(0), &entry.images);
                }
                DayCell {
                    in_month: date.year() == year && date.month0() == month,
                    is_today: date == today,
                    uploading: state.uploads.is_pending(&key),
                    date,
                    key,
                    entry,
                }
            })
            .collect()
    };

    Ok(Html(render_month(&MonthPage {
        year,
        month,
        cells,
        picker,
        viewer,
        notice: query.notice,
    })))
}

pub async fn add_log(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Form(form): Form<LogTextRequest>,
) -> Result<Redirect, AppError> {
    let key = parse_key(&date)?;
    apply_edit(&state, &key, |editor| match editor.add_log(&form.text) {
        Ok(data) => Ok(Some(data)),
        Err(EditError::EmptyLog) => Ok(None),
        Err(err) => Err(err.into()),
    })
    .await?;
    Ok(back_to(&key, None))
}

pub async fn edit_log(
    State(state): State<AppState>,
    Path((date, id)): Path<(String, String)>,
    Form(form): Form<LogTextRequest>,
) -> Result<Redirect, AppError> {
    let key = parse_key(&date)?;
    apply_edit(&state, &key, |editor| Ok(Some(editor.edit_log(&id, &form.text)?))).await?;
    Ok(back_to(&key, None))
}

pub async fn delete_log(
    State(state): State<AppState>,
    Path((date, id)): Path<(String, String)>,
) -> Result<Redirect, AppError> {
    let key = parse_key(&date)?;
    apply_edit(&state, &key, |editor| Ok(editor.delete_log(&id))).await?;
    Ok(back_to(&key, None))
}

pub async fn set_color(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Form(form): Form<ColorRequest>,
) -> Result<Redirect, AppError> {
    let key = parse_key(&date)?;
    let color = parse_color(&form.color)?;
    apply_edit(&state, &key, |editor| Ok(Some(editor.set_color(color)))).await?;
    Ok(back_to(&key, None))
}

pub async fn set_weight(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Form(form): Form<WeightRequest>,
) -> Result<Redirect, AppError> {
    let key = parse_key(&date)?;
    apply_edit(&state, &key, |editor| {
        editor.set_weight_draft(form.weight);
        Ok(editor.blur_weight())
    })
    .await?;
    Ok(back_to(&key, None))
}

pub async fn add_images(
    State(state): State<AppState>,
    Path(date): Path<String>,
    mut multipart: Multipart,
) -> Result<Redirect, AppError> {
    let key = parse_key(&date)?;
    let files = read_images(&mut multipart).await?;
    if files.is_empty() {
        return Ok(back_to(&key, None));
    }

    let response = upload_images(&state, &key, files).await?;
    let notice = (!response.failures.is_empty()).then(|| {
        let names: Vec<_> = response.failures.iter().map(|f| f.name.as_str()).collect();
        format!("Could not process {} image(s): {}", names.len(), names.join(", "))
    });
    Ok(back_to(&key, notice.as_deref()))
}

pub async fn delete_image(
    State(state): State<AppState>,
    Path((date, index)): Path<(String, usize)>,
) -> Result<Redirect, AppError> {
    let key = parse_key(&date)?;
    apply_edit(&state, &key, |editor| Ok(editor.remove_image(index))).await?;
    Ok(back_to(&key, None))
}

fn back_to(key: &str, notice: Option<&str>) -> Redirect {
    let (year, month) = parse_date_key(key)
        .map(|date| (date.year(), date.month0()))
        .unwrap_or_else(|| {
            let today = today();
            (today.year(), today.month0())
        });
    let mut url = month_url(year, month);
    if let Some(notice) = notice {
        url.push_str("&notice=");
        url.push_str(&urlencoding::encode(notice));
    }
    Redirect::to(&url)
}
