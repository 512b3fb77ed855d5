//! Plain-text rendering of lectures, amendements and events.

use std::collections::HashMap;

use chrono::Local;
use zam_core::diff::strip_tags;
use zam_core::{Amendement, Article, Chambre, Event, Lecture};
use zam_sync::{FetchResult, Report};

const MAX_AUTEUR: usize = 28;

// ── Lectures ──

pub fn print_lectures(lectures: &[Lecture]) {
    if lectures.is_empty() {
        println!("(aucune lecture)");
        return;
    }
    println!("{:>4}  {:<32} {}", "id", "lecture", "titre");
    for lecture in lectures {
        println!("{:>4}  {:<32} {}", lecture.id, lecture.to_string(), lecture.titre);
    }
}

// ── Amendements ──

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max - 1).collect();
    out.push('…');
    out
}

pub fn print_amendements(amendements: &[Amendement], articles: &HashMap<i64, Article>) {
    println!(
        "{:<16} {:<20} {:>5}  {:<14} {:<MAX_AUTEUR$} {:<24} {}",
        "num", "article", "pos", "sort", "auteur", "groupe", "lot"
    );
    for amendement in amendements {
        let article = amendement
            .article_id
            .and_then(|id| articles.get(&id))
            .map(|a| a.subdiv.to_string())
            .unwrap_or_default();
        let position = amendement.position.map(|p| p.to_string()).unwrap_or_else(|| "-".into());
        let batch = amendement.batch_id.map(|b| b.to_string()).unwrap_or_default();
        println!(
            "{:<16} {:<20} {:>5}  {:<14} {:<MAX_AUTEUR$} {:<24} {}",
            amendement.num_disp(),
            article,
            position,
            truncate(&amendement.sort, 14),
            truncate(&amendement.auteur, MAX_AUTEUR),
            truncate(&amendement.groupe, 24),
            batch
        );
    }
    let ranked = amendements.iter().filter(|a| a.position.is_some()).count();
    println!();
    println!("{} amendement(s), {ranked} en discussion", amendements.len());
}

// ── Events ──

pub fn print_events(events: &[Event], chambre: Chambre, details: bool) {
    if events.is_empty() {
        println!("(aucun événement)");
        return;
    }
    for event in events {
        let when = event.created_at.with_timezone(&Local).format("%d/%m/%Y %H:%M");
        println!(
            "{when}  [{:<7}] {}",
            event.level().as_str(),
            strip_tags(&event.render_summary(chambre))
        );
        if details {
            let rendered = event.render_details();
            if !rendered.is_empty() {
                println!("    {rendered}");
            }
        }
    }
}

// ── Fetch results ──

fn nums(set: &std::collections::BTreeSet<u32>) -> String {
    set.iter().map(u32::to_string).collect::<Vec<_>>().join(", ")
}

pub fn print_fetch_result(result: &FetchResult) {
    if result.is_empty() {
        println!("Les amendements n’ont pas été trouvés.");
        return;
    }
    println!("  {:<12} {}", "récupérés", result.fetched.len());
    println!("  {:<12} {}", "nouveaux", result.created.len());
    if !result.created.is_empty() {
        println!("  {:<12} {}", "", nums(&result.created));
    }
    if !result.errored.is_empty() {
        println!("  {:<12} {}", "en erreur", nums(&result.errored));
    }
}

pub fn print_report(report: &Report) {
    let articles = if report.articles_changed { "mis à jour" } else { "inchangés" };
    println!("  {:<12} {articles}", "articles");
    print_fetch_result(&report.amendements);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_long_names() {
        assert_eq!(truncate("M. GRAND", 28), "M. GRAND");
        assert_eq!(truncate("abcdef", 4), "abc…");
    }
}
