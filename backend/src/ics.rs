//! RFC 5545 calendar feed emission for the public read surface's
//! `calendar.ics` endpoint.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::model::Game;

pub struct CalendarEvent {
    pub uid: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub summary: String,
    pub location: String,
    pub description: String,
}

impl CalendarEvent {
    pub fn from_game(game: &Game, home_name: &str, away_name: &str, venue_name: &str) -> Self {
        Self {
            uid: game.id,
            start: game.scheduled_start,
            end: game.end(),
            summary: format!("{home_name} vs {away_name}"),
            location: venue_name.to_string(),
            description: format!("Game {}", game.game_number),
        }
    }
}

fn fold_ics_date(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%SZ").to_string()
}

fn escape_text(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(',', "\\,")
        .replace(';', "\\;")
        .replace('\n', "\\n")
}

/// `VCALENDAR` with a `TZID:America/Phoenix` block (no DST rule, since
/// Arizona doesn't observe one) and one `VEVENT` per game, each with a
/// 1-hour-before alarm.
pub fn render_calendar(events: &[CalendarEvent], prodid: &str) -> String {
    let mut lines = vec![];
    lines.push("BEGIN:VCALENDAR".to_string());
    lines.push("VERSION:2.0".to_string());
    lines.push(format!("PRODID:{prodid}"));
    lines.push("METHOD:PUBLISH".to_string());
    lines.push("BEGIN:VTIMEZONE".to_string());
    lines.push("TZID:America/Phoenix".to_string());
    lines.push("BEGIN:STANDARD".to_string());
    lines.push("DTSTART:19700101T000000".to_string());
    lines.push("TZOFFSETFROM:-0700".to_string());
    lines.push("TZOFFSETTO:-0700".to_string());
    lines.push("END:STANDARD".to_string());
    lines.push("END:VTIMEZONE".to_string());

    for event in events {
        lines.push("BEGIN:VEVENT".to_string());
        lines.push(format!("UID:{}", event.uid));
        lines.push(format!("DTSTART:{}", fold_ics_date(event.start)));
        lines.push(format!("DTEND:{}", fold_ics_date(event.end)));
        lines.push(format!("SUMMARY:{}", escape_text(&event.summary)));
        lines.push(format!("LOCATION:{}", escape_text(&event.location)));
        lines.push(format!("DESCRIPTION:{}", escape_text(&event.description)));
        lines.push("BEGIN:VALARM".to_string());
        lines.push("ACTION:DISPLAY".to_string());
        lines.push("TRIGGER:-PT1H".to_string());
        lines.push(format!("DESCRIPTION:{}", escape_text(&event.summary)));
        lines.push("END:VALARM".to_string());
        lines.push("END:VEVENT".to_string());
    }

    lines.push("END:VCALENDAR".to_string());
    lines.join("\r\n") + "\r\n"
}

/// ICS validation checks: presence of the calendar envelope and, for
/// every event, the four required properties.
pub fn validate_calendar(ics: &str) -> Result<(), String> {
    if !ics.contains("BEGIN:VCALENDAR") || !ics.contains("END:VCALENDAR") {
        return Err("missing VCALENDAR envelope".to_string());
    }
    if !ics.contains("VERSION:2.0") {
        return Err("missing VERSION:2.0".to_string());
    }
    if !ics.contains("PRODID:") {
        return Err("missing PRODID".to_string());
    }

    let event_count = ics.matches("BEGIN:VEVENT").len();
    if event_count != ics.matches("END:VEVENT").len() {
        return Err("mismatched VEVENT blocks".to_string());
    }

    for block in ics.split("BEGIN:VEVENT").skip(1) {
        let body = block.split("END:VEVENT").next().unwrap_or("");
        for required in ["UID:", "DTSTART:", "DTEND:", "SUMMARY:"] {
            if !body.contains(required) {
                return Err(format!("event missing {required}"));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn event(uid: Uuid, start: DateTime<Utc>) -> CalendarEvent {
        CalendarEvent {
            uid,
            start,
            end: start + Duration::minutes(90),
            summary: "A vs B".to_string(),
            location: "V1".to_string(),
            description: "Game G001".to_string(),
        }
    }

    #[test]
    fn scenario_6_three_events_produce_three_vevent_blocks() {
        let base = Utc::now();
        let events: Vec<CalendarEvent> = (0..3)
            .map(|i| event(Uuid::new_v4(), base + Duration::days(i)))
            .collect();

        let ics = render_calendar(&events, "-//league//scheduling//EN");

        assert!(ics.contains("BEGIN:VCALENDAR"));
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 3);
        assert!(ics.contains("TZID:America/Phoenix"));
        assert!(validate_calendar(&ics).is_ok());
    }

    #[test]
    fn validate_rejects_missing_vcalendar() {
        assert!(validate_calendar("not a calendar").is_err());
    }

    #[test]
    fn validate_rejects_event_missing_required_property() {
        let broken = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//x//\r\nBEGIN:VEVENT\r\nUID:1\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
        assert!(validate_calendar(broken).is_err());
    }
}
