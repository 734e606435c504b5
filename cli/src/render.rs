use std::fmt::Write;

use wingrox_core::auth::FormStatus;
use wingrox_core::coaches::{self, Marketplace};
use wingrox_core::downloads::{self, DownloadState};
use wingrox_core::listing::RequestState;
use wingrox_core::model::{Coach, UserProfile};
use wingrox_core::nav::Navigator;
use wingrox_core::profile::{ProfileState, NOT_LOGGED_IN};

/// Prints navigation and alerts instead of performing them.
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: &str) {
        println!("-> {}", route);
    }

    fn alert(&self, message: &str) {
        eprintln!("! {}", message);
    }
}

fn coach_line(coach: &Coach) -> String {
    let mut line = coach.name.clone();
    if let Some(title) = &coach.title {
        let _ = write!(line, ", {}", title);
    }
    if !coach.specialties.is_empty() {
        let _ = write!(line, " [{}]", coach.specialties.join(", "));
    }
    if let Some(rating) = coach.rating {
        let _ = write!(line, " {:.1}*", rating);
    }
    if let Some(rate) = coach.hourly_rate {
        let _ = write!(line, " ${:.0}/h", rate);
    }
    line
}

pub fn marketplace(market: &Marketplace, state: &RequestState<Coach>) -> String {
    let query = market.query();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Coaches ({})",
        query.filter.as_deref().unwrap_or(wingrox_core::listing::ALL_FILTER)
    );
    match state {
        RequestState::Idle | RequestState::Loading => {
            let _ = writeln!(out, "Loading...");
        }
        RequestState::Failure(msg) => {
            let _ = writeln!(out, "Error: {}", msg);
        }
        RequestState::Success(r) if r.is_empty() => {
            let _ = writeln!(out, "{}", coaches::EMPTY_MESSAGE);
        }
        RequestState::Success(r) => {
            for (i, coach) in r.items.iter().enumerate() {
                let n = (query.page as usize - 1) * query.limit as usize + i + 1;
                let _ = writeln!(out, "{:>3}. {}", n, coach_line(coach));
            }
            let _ = writeln!(
                out,
                "Page {} of {} ({} coaches){}{}",
                query.page,
                r.total_pages.max(1),
                r.total_count,
                if market.can_go_previous() { "  [prev]" } else { "" },
                if r.has_more { "  [next]" } else { "" },
            );
        }
    }
    out
}

pub fn profile(state: &ProfileState) -> String {
    match state {
        ProfileState::NotLoggedIn => NOT_LOGGED_IN.to_string(),
        ProfileState::Loaded(p) => profile_lines(p),
    }
}

fn profile_lines(p: &UserProfile) -> String {
    let mut out = format!("Name:  {}\nEmail: {}", p.name, p.email);
    if let Some(verified) = p.email_verified {
        out.push_str(if verified { " (verified)" } else { " (unverified)" });
    }
    if let Some(role) = &p.role {
        let _ = write!(out, "\nRole:  {}", role);
    }
    if let Some(phone) = &p.phone {
        let _ = write!(out, "\nPhone: {}", phone);
    }
    out
}

pub fn downloads(state: &DownloadState) -> String {
    match state {
        DownloadState::Empty => downloads::EMPTY_MESSAGE.to_string(),
        DownloadState::Failure(msg) => format!("Error: {}", msg),
        DownloadState::Ready(files) => files
            .iter()
            .map(|f| {
                let mut line = format!("- {}", f.display_name());
                if let Some(size) = f.human_size() {
                    let _ = write!(line, " ({})", size);
                }
                if let Some(date) = f.upload_date {
                    let _ = write!(line, " {}", date.format("%Y-%m-%d"));
                }
                let _ = write!(line, "\n  {}", f.url);
                line
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

pub fn form_status(status: &FormStatus) -> String {
    match (status.error(), status.success()) {
        (Some(e), _) => format!("Error: {}", e),
        (None, Some(s)) => s.to_string(),
        (None, None) => String::new(),
    }
}
