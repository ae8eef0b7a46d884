use crate::calendar::{month_grid, next_month, previous_month};
use crate::models::{AppData, DayId, PlanId};
use crate::page::{DAY_ID_ATTR, STATUS_ATTR};
use chrono::{Datelike, NaiveDate};
use html_escape::{encode_double_quoted_attribute, encode_text};

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

/// Renders the month grid, coloured and filtered by `plan` when given.
/// `None` for an invalid year/month.
pub fn render_month(
    year: i32,
    month: u32,
    today: NaiveDate,
    plan: Option<PlanId>,
    data: &AppData,
) -> Option<String> {
    let grid = month_grid(year, month)?;
    let title = format!("{} {year}", MONTH_NAMES[month as usize - 1]);
    let (prev_year, prev_month) = previous_month(year, month);
    let (following_year, following_month) = next_month(year, month);
    let filter = plan.map(|id| format!("?plan_id={id}")).unwrap_or_default();

    Some(
        MONTH_HTML
            .replace("{{TITLE}}", &title)
            .replace("{{PREV}}", &format!("/calendar/{prev_year}/{prev_month}{filter}"))
            .replace("{{NEXT}}", &format!("/calendar/{following_year}/{following_month}{filter}"))
            .replace("{{PLANS}}", &render_plan_links(year, month, plan, data))
            .replace("{{CELLS}}", &render_cells(&grid, today, plan, data)),
    )
}

fn render_plan_links(year: i32, month: u32, active: Option<PlanId>, data: &AppData) -> String {
    let mut links = format!(
        "<a class=\"plan{}\" href=\"/calendar/{year}/{month}\">All plans</a>",
        if active.is_none() { " active" } else { "" },
    );
    for plan in data.plans.values() {
        links.push_str(&format!(
            "<a class=\"plan{active}\" href=\"/calendar/{year}/{month}?plan_id={id}\" style=\"--plan-color: {color}\" title=\"{subject}\">{title}</a>",
            active = if active == Some(plan.plan_id) { " active" } else { "" },
            id = plan.plan_id,
            color = plan.color(),
            subject = encode_double_quoted_attribute(&plan.subject),
            title = encode_text(&plan.title),
        ));
    }
    links
}

fn render_cells(
    grid: &[Option<NaiveDate>],
    today: NaiveDate,
    plan: Option<PlanId>,
    data: &AppData,
) -> String {
    let mut cells = String::new();
    for slot in grid {
        match slot {
            Some(date) => {
                let status = data.status_on(*date, plan);
                let plan_marker = data
                    .lead_task(*date, plan)
                    .map(|(owner, _)| {
                        format!(
                            " data-plan-id=\"{}\" style=\"--plan-color: {}\"",
                            owner.plan_id,
                            owner.color()
                        )
                    })
                    .unwrap_or_default();
                let today_marker = if *date == today { " aria-current=\"date\"" } else { "" };
                cells.push_str(&format!(
                    "<div class=\"day {status}\" {DAY_ID_ATTR}=\"{id}\" {STATUS_ATTR}=\"{status}\"{plan_marker}{today_marker}><span class=\"num\">{num}</span></div>",
                    id = DayId::from_date(*date),
                    num = date.day(),
                ));
            }
            None => cells.push_str("<div class=\"blank\"></div>"),
        }
        cells.push('\n');
    }
    cells
}

const MONTH_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Study Calendar - {{TITLE}}</title>
  <style>
    :root {
      --ink: #2b2a28;
      --card: rgba(255, 255, 255, 0.9);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
      --planned: #bae1ff;
      --done: #baffc9;
      --partial: #ffffba;
      --missed: #ffb3ba;
      --none: #eeeeee;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: linear-gradient(135deg, #f8f3e6, #ffe9d4 60%, #f9f2e9 100%);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(860px, 100%);
      background: var(--card);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 24px;
    }

    header {
      display: flex;
      align-items: center;
      justify-content: space-between;
    }

    h1 {
      font-family: "Georgia", serif;
      margin: 0;
    }

    header a {
      color: var(--ink);
      text-decoration: none;
      font-size: 1.4rem;
      padding: 4px 12px;
    }

    .grid {
      display: grid;
      grid-template-columns: repeat(7, 1fr);
      gap: 8px;
    }

    .weekday {
      text-align: center;
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: #8b857d;
    }

    .day {
      aspect-ratio: 1;
      border-radius: 14px;
      padding: 8px;
      cursor: pointer;
      user-select: none;
      border: 1px solid rgba(47, 72, 88, 0.08);
      transition: transform 150ms ease;
    }

    .day:active {
      transform: scale(0.96);
    }

    .day[aria-current="date"] {
      outline: 2px solid var(--ink);
    }

    .day.planned { background: var(--planned); }
    .day.done { background: var(--done); }
    .day.partial { background: var(--partial); }
    .day.missed { background: var(--missed); }
    .day.none { background: var(--none); }

    .day[data-plan-id] {
      box-shadow: inset 0 0 0 3px var(--plan-color);
    }

    .plans {
      display: flex;
      flex-wrap: wrap;
      gap: 8px;
    }

    .plans a {
      color: var(--ink);
      text-decoration: none;
      font-size: 0.85rem;
      padding: 4px 12px;
      border-radius: 999px;
      background: var(--plan-color, #e5e7eb);
      opacity: 0.6;
    }

    .plans a.active {
      opacity: 1;
      font-weight: bold;
    }

    .legend {
      display: flex;
      flex-wrap: wrap;
      gap: 12px;
      font-size: 0.85rem;
      color: #5f5c57;
    }

    .legend span::before {
      content: "";
      display: inline-block;
      width: 10px;
      height: 10px;
      border-radius: 3px;
      margin-right: 6px;
      background: var(--swatch);
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <a href="{{PREV}}" aria-label="Previous month">&larr;</a>
      <h1>{{TITLE}}</h1>
      <a href="{{NEXT}}" aria-label="Next month">&rarr;</a>
    </header>
    <nav class="plans">{{PLANS}}</nav>
    <section class="grid">
      <div class="weekday">Sun</div>
      <div class="weekday">Mon</div>
      <div class="weekday">Tue</div>
      <div class="weekday">Wed</div>
      <div class="weekday">Thu</div>
      <div class="weekday">Fri</div>
      <div class="weekday">Sat</div>
{{CELLS}}
    </section>
    <footer class="legend">
      <span style="--swatch: var(--planned)">planned</span>
      <span style="--swatch: var(--done)">done</span>
      <span style="--swatch: var(--partial)">partial</span>
      <span style="--swatch: var(--missed)">missed</span>
      <span style="--swatch: var(--none)">none</span>
    </footer>
  </main>

  <script>
    const ORDER = ['planned', 'done', 'partial', 'missed', 'none'];

    const nextStatus = (current) => ORDER[(ORDER.indexOf(current) + 1) % ORDER.length];

    document.addEventListener('click', async (event) => {
      const cell = event.target.closest('[data-day-id]');
      if (!cell) {
        return;
      }

      const status = nextStatus(cell.dataset.status);
      const res = await fetch('/day/status', {
        method: 'POST',
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify({ day_id: Number(cell.dataset.dayId), status })
      });
      const body = await res.json();

      if (body.ok) {
        cell.dataset.status = status;
        cell.className = 'day ' + status;
      } else {
        alert(body.error || 'update failed');
      }
    });
  </script>
</body>
</html>
"#;
