use crate::calendar::{MONTH_NAMES, WEEKDAY_NAMES, shift_month};
use crate::editor::{ColorPicker, ImageViewer};
use crate::models::{Color, EntryData};
use chrono::{Datelike, NaiveDate};
use strum::IntoEnumIterator;

pub struct DayCell {
    pub date: NaiveDate,
    pub key: String,
    pub entry: EntryData,
    pub in_month: bool,
    pub is_today: bool,
    pub uploading: bool,
}

pub struct MonthPage {
    pub year: i32,
    pub month: u32,
    pub cells: Vec<DayCell>,
    pub picker: ColorPicker,
    pub viewer: ImageViewer,
    pub notice: Option<String>,
}

pub fn month_url(year: i32, month: u32) -> String {
    format!("/?year={year}&month={month}")
}

pub fn render_month(page: &MonthPage) -> String {
    let (prev_year, prev_month) = shift_month(page.year, page.month, -1);
    let (next_year, next_month) = shift_month(page.year, page.month, 1);
    let title = format!("{} {}", MONTH_NAMES[page.month as usize % 12], page.year);

    let weekdays: String = WEEKDAY_NAMES
        .iter()
        .map(|day| format!("<div class=\"weekday\">{day}</div>"))
        .collect();
    let cells: String = page.cells.iter().map(|cell| render_cell(page, cell)).collect();
    let notice = page
        .notice
        .as_deref()
        .map(|notice| format!("<div class=\"notice\" role=\"status\">{}</div>", escape(notice)))
        .unwrap_or_default();

    INDEX_HTML
        .replace("{{TITLE}}", &title)
        .replace("{{PREV}}", &month_url(prev_year, prev_month))
        .replace("{{NEXT}}", &month_url(next_year, next_month))
        .replace("{{NOTICE}}", &notice)
        .replace("{{WEEKDAYS}}", &weekdays)
        .replace("{{CELLS}}", &cells)
        .replace("{{VIEWER}}", &render_viewer(page))
}

fn render_cell(page: &MonthPage, cell: &DayCell) -> String {
    let key = &cell.key;
    let color = cell.entry.resolved_color();
    let mut classes = vec!["cell"];
    if !cell.in_month {
        classes.push("outside");
    }
    if cell.is_today {
        classes.push("today");
    }
    let background = if cell.in_month { color.swatch() } else { "#f9fafb" };
    let id = if cell.is_today { " id=\"today-cell\"" } else { "" };
    let weekday = WEEKDAY_NAMES[cell.date.weekday().num_days_from_sunday() as usize];

    let mut html = format!(
        "<div class=\"{}\"{id} style=\"background:{background}\">\
         <div class=\"cell-head\"><span class=\"date\"><span class=\"dow\">{weekday}</span> {}</span>",
        classes.join(" "),
        cell.date.day(),
    );

    if cell.in_month {
        html.push_str(&render_controls(page, cell, color));
    }
    html.push_str("</div><ul class=\"logs\">");

    for log in &cell.entry.logs {
        if !cell.in_month {
            html.push_str(&format!("<li><span class=\"text\">{}</span></li>", escape(&log.text)));
            continue;
        }
        html.push_str(&format!(
            "<li><form method=\"post\" action=\"/days/{key}/logs/{id}\">\
             <textarea name=\"text\" rows=\"{rows}\" spellcheck=\"false\" onchange=\"this.form.submit()\">{text}</textarea></form>\
             <form method=\"post\" action=\"/days/{key}/logs/{id}/delete\">\
             <button class=\"icon\" title=\"Delete entry\">&times;</button></form></li>",
            id = escape(&log.id),
            rows = (log.text.chars().count().div_ceil(30)).clamp(1, 4),
            text = escape(&log.text),
        ));
    }
    html.push_str("</ul>");

    if !cell.entry.images.is_empty() {
        html.push_str("<div class=\"thumbs\">");
        for (index, image) in cell.entry.images.iter().enumerate() {
            html.push_str(&format!(
                "<a href=\"{}&amp;view={key}&amp;image={index}\"><img src=\"{}\" alt=\"Photo {}\" /></a>",
                month_url(page.year, page.month),
                escape(image),
                index + 1,
            ));
        }
        html.push_str("</div>");
    }

    if cell.in_month {
        html.push_str(&format!(
            "<form class=\"add\" method=\"post\" action=\"/days/{key}/logs\">\
             <input type=\"text\" name=\"text\" placeholder=\"Add entry...\" autocomplete=\"off\" />\
             <button class=\"icon\" title=\"Add entry\">+</button></form>"
        ));
    }
    html.push_str("</div>");
    html
}

fn render_controls(page: &MonthPage, cell: &DayCell, color: Color) -> String {
    let key = &cell.key;
    let weight = escape(cell.entry.weight.as_deref().unwrap_or_default());
    let mut html = format!(
        "<div class=\"controls\"><form class=\"weight\" method=\"post\" action=\"/days/{key}/weight\">\
         <input type=\"text\" name=\"weight\" value=\"{weight}\" placeholder=\"#\" title=\"Track weight\" \
         onchange=\"this.form.submit()\" /></form>"
    );

    if cell.uploading {
        html.push_str("<span class=\"spinner\" title=\"Processing photos\">&hellip;</span>");
    } else {
        html.push_str(&format!(
            "<form class=\"upload\" method=\"post\" action=\"/days/{key}/images\" enctype=\"multipart/form-data\">\
             <label class=\"icon\" title=\"Attach photos\">&#128247;\
             <input type=\"file\" name=\"images\" accept=\"image/*\" multiple onchange=\"this.form.submit()\" />\
             </label></form>"
        ));
    }

    let mut toggled = page.picker.clone();
    toggled.toggle(key);
    let toggle_url = match toggled.open_for() {
        Some(open) => format!("{}&amp;picker={open}", month_url(page.year, page.month)),
        None => month_url(page.year, page.month),
    };
    html.push_str(&format!(
        "<a class=\"icon palette\" href=\"{toggle_url}\" title=\"Color code this day\">&#127912;</a>"
    ));

    if page.picker.is_open_for(key) {
        html.push_str("<div class=\"picker\">");
        for option in Color::iter() {
            let selected = if option == color { " selected" } else { "" };
            html.push_str(&format!(
                "<form method=\"post\" action=\"/days/{key}/color\">\
                 <input type=\"hidden\" name=\"color\" value=\"{id}\" />\
                 <button class=\"swatch{selected}\" style=\"background:{swatch}\" title=\"{label}\"></button></form>",
                id = option.id(),
                swatch = option.swatch(),
                label = option.label(),
            ));
        }
        html.push_str("</div>");
    }
    html.push_str("</div>");
    html
}

fn render_viewer(page: &MonthPage) -> String {
    let ImageViewer::Showing { date_key, index } = &page.viewer else {
        return String::new();
    };
    let Some(image) = page
        .cells
        .iter()
        .find(|cell| &cell.key == date_key)
        .and_then(|cell| cell.entry.images.get(*index))
    else {
        return String::new();
    };
    let close = month_url(page.year, page.month);
    format!(
        "<div class=\"viewer\"><a class=\"backdrop\" href=\"{close}\" aria-label=\"Close\"></a>\
         <figure><img src=\"{}\" alt=\"Photo\" />\
         <figcaption><a href=\"{close}\">Close</a>\
         <form method=\"post\" action=\"/days/{date_key}/images/{index}/delete\"><button>Remove photo</button></form>\
         </figcaption></figure></div>",
        escape(image),
    )
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>LifeTrack · {{TITLE}}</title>
  <style>
    :root {
      --ink: #111827;
      --muted: #9ca3af;
      --line: #e5e7eb;
      --accent: #4f46e5;
      --card: #ffffff;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      background: #f9fafb;
      color: var(--ink);
      font-family: system-ui, -apple-system, "Segoe UI", sans-serif;
    }

    header {
      display: flex;
      flex-wrap: wrap;
      align-items: center;
      justify-content: space-between;
      gap: 12px;
      padding: 16px 24px;
      background: var(--card);
      border-bottom: 1px solid var(--line);
    }

    header h1 {
      margin: 0;
      font-size: 1.4rem;
    }

    nav {
      display: flex;
      align-items: center;
      gap: 12px;
    }

    nav a {
      color: var(--ink);
      text-decoration: none;
      padding: 6px 12px;
      border-radius: 999px;
      border: 1px solid var(--line);
    }

    nav .month {
      font-weight: 600;
      min-width: 10em;
      text-align: center;
    }

    main {
      max-width: 1600px;
      margin: 0 auto;
      padding: 24px;
    }

    .notice {
      margin-bottom: 16px;
      padding: 12px 16px;
      border-radius: 12px;
      background: #fef2f2;
      color: #b91c1c;
    }

    .board {
      background: var(--card);
      border-radius: 16px;
      border: 1px solid var(--line);
      overflow: hidden;
    }

    .weekdays,
    .grid {
      display: grid;
      grid-template-columns: repeat(7, 1fr);
    }

    .weekday {
      padding: 10px;
      text-align: center;
      font-size: 0.8rem;
      font-weight: 600;
      text-transform: uppercase;
      letter-spacing: 0.08em;
      color: #6b7280;
      border-bottom: 1px solid var(--line);
    }

    .cell {
      position: relative;
      display: flex;
      flex-direction: column;
      gap: 4px;
      min-height: 180px;
      padding: 8px;
      border-right: 1px solid var(--line);
      border-bottom: 1px solid var(--line);
    }

    .cell.outside {
      color: var(--muted);
    }

    .cell.today {
      box-shadow: inset 0 0 0 2px #c7d2fe;
    }

    .cell.today .date {
      background: var(--accent);
      color: white;
      border-radius: 999px;
      padding: 1px 8px;
    }

    .cell-head {
      display: flex;
      align-items: center;
      justify-content: space-between;
      gap: 4px;
    }

    .dow {
      display: none;
    }

    .controls {
      position: relative;
      display: flex;
      align-items: center;
      gap: 4px;
    }

    .weight input {
      width: 3.5em;
      border: 1px solid transparent;
      background: rgba(255, 255, 255, 0.6);
      border-radius: 6px;
      text-align: right;
      font-size: 0.8rem;
    }

    .icon {
      border: none;
      background: none;
      cursor: pointer;
      color: var(--muted);
      text-decoration: none;
      font-size: 0.9rem;
      padding: 2px 4px;
    }

    .upload input[type="file"] {
      display: none;
    }

    .spinner {
      color: var(--accent);
      font-weight: 700;
    }

    .picker {
      position: absolute;
      top: 100%;
      right: 0;
      z-index: 5;
      display: grid;
      grid-template-columns: repeat(4, auto);
      gap: 6px;
      padding: 8px;
      background: white;
      border-radius: 12px;
      border: 1px solid var(--line);
      box-shadow: 0 10px 24px rgba(17, 24, 39, 0.12);
    }

    .swatch {
      width: 26px;
      height: 26px;
      border-radius: 999px;
      border: 1px solid var(--line);
      cursor: pointer;
    }

    .swatch.selected {
      outline: 2px solid var(--muted);
      outline-offset: 1px;
    }

    .logs {
      list-style: none;
      margin: 0;
      padding: 0;
      display: grid;
      gap: 2px;
      flex: 1;
    }

    .logs li {
      display: flex;
      align-items: flex-start;
    }

    .logs li form:first-child {
      flex: 1;
    }

    .logs .text {
      font-size: 0.85rem;
      white-space: pre-wrap;
      word-break: break-word;
    }

    .logs textarea {
      width: 100%;
      resize: none;
      border: none;
      background: transparent;
      font: inherit;
      font-size: 0.85rem;
      color: inherit;
    }

    .thumbs {
      display: flex;
      flex-wrap: wrap;
      gap: 4px;
    }

    .thumbs img {
      width: 40px;
      height: 40px;
      object-fit: cover;
      border-radius: 6px;
    }

    .add {
      display: flex;
      gap: 4px;
    }

    .add input {
      flex: 1;
      min-width: 0;
      border: none;
      border-bottom: 1px dashed var(--line);
      background: transparent;
      font-size: 0.85rem;
    }

    .viewer {
      position: fixed;
      inset: 0;
      z-index: 20;
      display: grid;
      place-items: center;
    }

    .viewer .backdrop {
      position: absolute;
      inset: 0;
      background: rgba(17, 24, 39, 0.8);
    }

    .viewer figure {
      position: relative;
      margin: 0;
      display: grid;
      gap: 12px;
      justify-items: center;
    }

    .viewer img {
      max-width: 90vw;
      max-height: 80vh;
      border-radius: 12px;
    }

    .viewer figcaption {
      display: flex;
      gap: 16px;
      align-items: center;
    }

    .viewer figcaption a {
      color: white;
    }

    footer {
      padding: 24px;
      text-align: center;
      color: var(--muted);
      font-size: 0.85rem;
    }

    @media (max-width: 640px) {
      main {
        padding: 8px;
      }
      .weekdays {
        display: none;
      }
      .grid {
        grid-template-columns: repeat(2, 1fr);
      }
      .dow {
        display: inline;
      }
      .cell.outside {
        display: none;
      }
    }
  </style>
</head>
<body>
  <header>
    <h1>LifeTrack</h1>
    <nav>
      <a href="{{PREV}}" aria-label="Previous month">&larr;</a>
      <span class="month">{{TITLE}}</span>
      <a href="{{NEXT}}" aria-label="Next month">&rarr;</a>
      <a href="/#today-cell">Today</a>
    </nav>
  </header>

  <main>
    {{NOTICE}}
    <section class="board">
      <div class="weekdays">{{WEEKDAYS}}</div>
      <div class="grid">{{CELLS}}</div>
    </section>
  </main>

  {{VIEWER}}

  <footer>Entries are kept in a single local data file.</footer>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{calendar_days, date_key};
    use crate::models::LogEntry;

    fn page(entries: &[(&str, EntryData)]) -> MonthPage {
        let cells = calendar_days(2024, 1)
            .unwrap()
            .into_iter()
            .map(|date| {
                let key = date_key(date);
                let entry = entries
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, e)| e.clone())
                    .unwrap_or_default();
                DayCell {
                    in_month: date.month0() == 1,
                    is_today: false,
                    uploading: false,
                    date,
                    key,
                    entry,
                }
            })
            .collect();
        MonthPage {
            year: 2024,
            month: 1,
            cells,
            picker: ColorPicker::default(),
            viewer: ImageViewer::default(),
            notice: None,
        }
    }

    #[test]
    fn log_text_is_escaped() {
        let entry = EntryData {
            logs: vec![LogEntry::new("<script>alert(1)</script>")],
            ..EntryData::default()
        };
        let html = render_month(&page(&[("2024-02-10", entry)]));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>alert(1)"));
    }

    #[test]
    fn navigation_links_roll_over() {
        let html = render_month(&page(&[]));
        assert!(html.contains("February 2024"));
        assert!(html.contains("href=\"/?year=2024&month=0\""));
        assert!(html.contains("href=\"/?year=2024&month=2\""));
    }

    #[test]
    fn picker_renders_only_for_its_day() {
        let mut month = page(&[]);
        month.picker.open("2024-02-10");
        let html = render_month(&month);
        assert_eq!(html.matches("class=\"picker\"").count(), 1);
        assert_eq!(html.matches("name=\"color\"").count(), 8);
    }

    #[test]
    fn unknown_color_renders_as_default() {
        let entry = EntryData {
            color: Some("teal".into()),
            ..EntryData::default()
        };
        let html = render_month(&page(&[("2024-02-10", entry)]));
        assert!(!html.contains("teal"));
    }

    #[test]
    fn viewer_shows_selected_image() {
        let entry = EntryData {
            images: vec!["data:image/jpeg;base64,QUFB".into()],
            ..EntryData::default()
        };
        let mut month = page(&[("2024-02-10", entry)]);
        month.viewer = ImageViewer::Showing {
            date_key: "2024-02-10".into(),
            index: 0,
        };
        let html = render_month(&month);
        assert!(html.contains("class=\"viewer\""));
        assert!(html.contains("/days/2024-02-10/images/0/delete"));
    }

    #[test]
    fn logs_outside_the_month_are_read_only() {
        let entry = || EntryData {
            logs: vec![LogEntry::new("swim")],
            ..EntryData::default()
        };
        let html = render_month(&page(&[("2024-01-30", entry()), ("2024-02-10", entry())]));
        assert_eq!(html.matches("<span class=\"text\">swim</span>").count(), 1);
        assert!(!html.contains("action=\"/days/2024-01-30/logs"));
        assert_eq!(html.matches("<textarea").count(), 1);
        assert!(html.contains("action=\"/days/2024-02-10/logs/"));
    }

    #[test]
    fn uploading_day_shows_indicator() {
        let mut month = page(&[]);
        let cell = month.cells.iter_mut().find(|c| c.key == "2024-02-10").unwrap();
        cell.uploading = true;
        let html = render_month(&month);
        assert_eq!(html.matches("class=\"spinner\"").count(), 1);
    }
}
