// Colored terminal output for analysis results.
//
// This module handles all terminal-specific formatting: colors, bar charts,
// progress bars. The main.rs command handlers delegate here.

use anyhow::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use super::{percent, truncate_chars};
use crate::aggregate::{ContinuousReport, DiscreteReport, LabelCounts, Outcome, ScanProgress};
use crate::analysis::{ScoredTable, TextAnalysis, VideoReport, VoiceAnalysis};
use crate::emotion::Emotion;
use crate::sentiment::{Classification, Distribution, SentimentLabel};

/// Width of the longest bar in the text charts.
const BAR_WIDTH: usize = 40;

/// Progress bar for a comment scan. The length is set from the first
/// progress event, since the comment count isn't known until fetching ends.
pub fn comment_progress_bar() -> Result<ProgressBar> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Comments [{bar:30}] {pos}/{len} ({eta})")?
            .progress_chars("=> "),
    );
    Ok(pb)
}

/// Feed one aggregator progress event into a bar.
pub fn update_progress(pb: &ProgressBar, progress: ScanProgress) {
    pb.set_length(progress.total as u64);
    pb.set_position(progress.scanned as u64);
}

pub fn display_text_analysis(analysis: &TextAnalysis) {
    match analysis {
        TextAnalysis::Single {
            classification,
            emotion,
        } => {
            display_classification(classification);
            display_emotion(emotion);
        }
        TextAnalysis::Video { report } => {
            println!("\n{}", "=== YouTube Comment Sentiment Analysis ===".bold());
            display_video_report(report);
        }
    }
}

pub fn display_voice_analysis(analysis: &VoiceAnalysis) {
    println!("\n  Recognized text: {}", truncate_chars(&analysis.transcript, 200).dimmed());
    display_classification(&analysis.classification);
    display_emotion(&analysis.emotion);
}

pub fn display_video_report(report: &VideoReport) {
    match report {
        VideoReport::Average(report) => display_continuous(report),
        VideoReport::Count(report) => display_discrete(report),
    }
}

/// Sentiment label plus the full distribution.
pub fn display_classification(classification: &Classification) {
    println!(
        "\n  Sentiment: {}",
        colorize_label(classification.label).bold()
    );
    display_distribution(&classification.distribution);
}

pub fn display_emotion(emotion: &Emotion) {
    println!("  Emotion: {} ({:.2})", emotion.label.cyan(), emotion.score);
}

fn display_distribution(d: &Distribution) {
    println!("    {} {}", "Positive:".green(), percent(d.positive));
    println!("    {} {}", "Neutral: ".normal(), percent(d.neutral));
    println!("    {} {}", "Negative:".red(), percent(d.negative));
}

pub fn display_continuous(report: &ContinuousReport) {
    if report.tally.cancelled {
        println!("  {}", "Cancelled before all comments were scanned.".yellow());
    }
    match (report.outcome(), &report.mean) {
        (Outcome::Analyzed, Some(mean)) => {
            println!("\n  Analyzed {} comments.", report.tally.analyzed.to_string().bold());
            display_distribution(mean);
            println!("\n  Average probability:");
            for label in SentimentLabel::ALL {
                let p = mean.get(label);
                let bar = "#".repeat((p * BAR_WIDTH as f64).round() as usize);
                println!("    {:<9} {} {}", label.as_str(), colorize_bar(label, &bar), percent(p));
            }
        }
        (outcome, _) => display_empty_outcome(outcome),
    }
    display_skipped(report.tally.failed);
}

pub fn display_discrete(report: &DiscreteReport) {
    if report.tally.cancelled {
        println!("  {}", "Cancelled before all comments were scanned.".yellow());
    }
    if report.outcome() != Outcome::Analyzed {
        display_empty_outcome(report.outcome());
        display_skipped(report.tally.failed);
        return;
    }

    println!("\n{}", "=== Sentiment Distribution ===".bold());
    display_counts(&report.counts);
    display_skipped(report.tally.failed);
}

fn display_counts(counts: &LabelCounts) {
    let max = SentimentLabel::ALL
        .iter()
        .map(|l| counts.get(*l))
        .max()
        .unwrap_or(0)
        .max(1);

    for label in [SentimentLabel::Positive, SentimentLabel::Neutral, SentimentLabel::Negative] {
        let count = counts.get(label);
        let bar = "#".repeat(count * BAR_WIDTH / max);
        println!("    {:<9} {} {}", label.as_str(), colorize_bar(label, &bar), count);
    }
    println!("    {:<9} {}", "Total", counts.total());
}

fn display_empty_outcome(outcome: Outcome) {
    match outcome {
        Outcome::NoComments => println!(
            "  {}",
            "No comments found for this video or comments could not be fetched.".yellow()
        ),
        Outcome::NoValidComments => println!("  {}", "No valid comments to analyze.".yellow()),
        Outcome::Analyzed => {}
    }
}

fn display_skipped(failed: usize) {
    if failed > 0 {
        println!(
            "  {} {failed} comments could not be classified and were skipped",
            "!".bright_red()
        );
    }
}

/// Short per-label summary of a scored CSV.
pub fn display_csv_summary(table: &ScoredTable) {
    let mut counts = LabelCounts::default();
    if let Some(idx) = table.headers.iter().position(|h| h == "Sentiment") {
        for row in &table.rows {
            if let Some(label) = row.get(idx).and_then(|v| v.parse::<SentimentLabel>().ok()) {
                counts.increment(label);
            }
        }
    }

    println!("\n{}", format!("=== Scored {} rows ===", table.rows.len()).bold());
    display_counts(&counts);
}

fn colorize_label(label: SentimentLabel) -> colored::ColoredString {
    match label {
        SentimentLabel::Positive => label.as_str().green(),
        SentimentLabel::Neutral => label.as_str().normal(),
        SentimentLabel::Negative => label.as_str().red(),
    }
}

fn colorize_bar(label: SentimentLabel, bar: &str) -> colored::ColoredString {
    match label {
        SentimentLabel::Positive => bar.green(),
        SentimentLabel::Neutral => bar.dimmed(),
        SentimentLabel::Negative => bar.red(),
    }
}
