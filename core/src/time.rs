use chrono::{Datelike, Days, Local, Months, NaiveDate, Weekday};
use anyhow::{anyhow, Result};

/// Resolve a due-date input relative to the local calendar day.
pub fn parse_due_date(input: &str) -> Result<NaiveDate> {
    parse_due_date_from(input, Local::now().date_naive())
}

/// Accepts `YYYY-MM-DD`, `today`, `tomorrow`, `eow`, `eom`, `+Nd`/`+Nw`/`+Nm`,
/// and weekday names (`fri`, `2:fri` for the Friday after next).
pub fn parse_due_date_from(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return Err(anyhow!("Empty date string"));
    }

    match input.to_lowercase().as_str() {
        "today" | "tod" => return Ok(today),
        "tomorrow" | "tom" => return add_days(today, 1),
        "eow" => {
            // Sunday closes the week
            let days_to_sunday = 6 - today.weekday().num_days_from_monday() as u64;
            return add_days(today, days_to_sunday);
        }
        "eom" => {
            let first = today.with_day(1).ok_or_else(|| anyhow!("Invalid date"))?;
            let next_month = first
                .checked_add_months(Months::new(1))
                .ok_or_else(|| anyhow!("Date out of range"))?;
            return next_month
                .checked_sub_days(Days::new(1))
                .ok_or_else(|| anyhow!("Date out of range"));
        }
        _ => {}
    }

    if let Some(rest) = input.strip_prefix('+') {
        return parse_relative(rest, today);
    }

    if let Some((count, day_str)) = parse_weekday_token(input) {
        if let Ok(target) = parse_weekday_str(day_str) {
            let target = target.num_days_from_monday() as u64;
            let current = today.weekday().num_days_from_monday() as u64;
            let first = if target > current { target - current } else { target + 7 - current };
            let days_needed = (count - 1)
                .checked_mul(7)
                .and_then(|extra| extra.checked_add(first))
                .ok_or_else(|| anyhow!("Date out of range"))?;
            return add_days(today, days_needed);
        }
    }

    if let Ok(d) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(input, "%d/%m/%Y") {
        return Ok(d);
    }

    Err(anyhow!("Could not parse date: {}", input))
}

fn parse_relative(rest: &str, today: NaiveDate) -> Result<NaiveDate> {
    let unit = rest.chars().last().ok_or_else(|| anyhow!("Invalid relative format"))?;
    let num_str = &rest[..rest.len() - unit.len_utf8()];
    let count: u32 = num_str.parse().map_err(|_| anyhow!("Invalid relative format"))?;

    match unit.to_ascii_lowercase() {
        'd' => add_days(today, count as u64),
        'w' => add_days(today, count as u64 * 7),
        // chrono clamps to the last day of a shorter month
        'm' => today
            .checked_add_months(Months::new(count))
            .ok_or_else(|| anyhow!("Date out of range")),
        other => Err(anyhow!("Unknown unit in relative time: {}", other)),
    }
}

fn add_days(date: NaiveDate, days: u64) -> Result<NaiveDate> {
    date.checked_add_days(Days::new(days))
        .ok_or_else(|| anyhow!("Date out of range"))
}

fn parse_weekday_token(input: &str) -> Option<(u64, &str)> {
    match input.split_once(':') {
        Some((count, day)) => count.parse::<u64>().ok().filter(|c| *c >= 1).map(|c| (c, day)),
        None => Some((1, input)),
    }
}

fn parse_weekday_str(s: &str) -> Result<Weekday> {
    match s.to_lowercase().as_str() {
        "mon" | "monday" => Ok(Weekday::Mon),
        "tue" | "tuesday" => Ok(Weekday::Tue),
        "wed" | "wednesday" => Ok(Weekday::Wed),
        "thu" | "thursday" => Ok(Weekday::Thu),
        "fri" | "friday" => Ok(Weekday::Fri),
        "sat" | "saturday" => Ok(Weekday::Sat),
        "sun" | "sunday" => Ok(Weekday::Sun),
        _ => Err(anyhow!("Invalid weekday")),
    }
}
