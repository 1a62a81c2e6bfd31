mod common;

use tenor::aggregate::{no_progress, Outcome};
use tenor::analysis::{
    AggregationMode, MissingTextColumn, RaggedRow, TextAnalysis, TextInputError, VideoReport,
};
use tenor::models::ModelBackend;
use tenor::sentiment::SentimentLabel;

use common::stub_analyzer;

const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

#[tokio::test]
async fn empty_text_is_a_warning_not_a_failure() {
    let (analyzer, models) = stub_analyzer(&[], "");

    for input in ["", "   ", "\n\t"] {
        let err = analyzer
            .analyze_text(input, ModelBackend::Classical, &mut no_progress)
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<TextInputError>(),
            Some(&TextInputError::Empty)
        );
    }
    assert!(models.requested().is_empty());
}

#[tokio::test]
async fn plain_text_gets_label_and_emotion() {
    let (analyzer, models) = stub_analyzer(&[], "");

    let analysis = analyzer
        .analyze_text("what a great day", ModelBackend::Classical, &mut no_progress)
        .await
        .unwrap();

    match analysis {
        TextAnalysis::Single {
            classification,
            emotion,
        } => {
            assert_eq!(classification.label, SentimentLabel::Positive);
            assert_eq!(emotion.label, "joy");
        }
        other => panic!("expected a single classification, got {other:?}"),
    }
    assert_eq!(models.requested(), vec![ModelBackend::Classical]);
}

#[tokio::test]
async fn youtube_link_averages_the_comments() {
    let (analyzer, models) = stub_analyzer(&["great video", "bad audio mix", "ok"], "");

    let analysis = analyzer
        .analyze_text(VIDEO_URL, ModelBackend::Transformer, &mut no_progress)
        .await
        .unwrap();

    let TextAnalysis::Video { report } = analysis else {
        panic!("expected a video report");
    };
    let VideoReport::Average(report) = report else {
        panic!("link input should use average mode");
    };
    let mean = report.mean.unwrap();
    assert!((mean.positive - 0.5).abs() < 1e-12);
    assert!((mean.negative - 0.5).abs() < 1e-12);
    assert_eq!(report.tally.fetched, 3);
    assert_eq!(report.tally.valid, 2);
    assert_eq!(models.requested(), vec![ModelBackend::Transformer]);
}

#[tokio::test]
async fn video_count_mode_honours_the_limit() {
    let (analyzer, _) = stub_analyzer(
        &["great one here", "great two here", "bad three here", "bad four here"],
        "",
    );

    let report = analyzer
        .analyze_video(
            VIDEO_URL,
            AggregationMode::Count,
            ModelBackend::Classical,
            3,
            &mut no_progress,
            None,
        )
        .await
        .unwrap();

    assert_eq!(report.mode(), AggregationMode::Count);
    assert_eq!(report.tally().fetched, 3);
    let VideoReport::Count(report) = report else {
        panic!("expected counts");
    };
    assert_eq!(report.counts.positive, 2);
    assert_eq!(report.counts.negative, 1);
}

#[tokio::test]
async fn video_without_comments_reports_no_comments() {
    let (analyzer, _) = stub_analyzer(&[], "");

    let report = analyzer
        .analyze_video(
            VIDEO_URL,
            AggregationMode::Average,
            ModelBackend::Classical,
            100,
            &mut no_progress,
            None,
        )
        .await
        .unwrap();
    assert_eq!(report.outcome(), Outcome::NoComments);
}

#[tokio::test]
async fn youtube_counts_always_use_the_transformer() {
    let (analyzer, models) = stub_analyzer(&["great stuff", "bad stuff", "fine stuff"], "");

    let report = analyzer
        .analyze_youtube(VIDEO_URL, &mut no_progress, None)
        .await
        .unwrap();

    assert_eq!(report.counts.positive, 1);
    assert_eq!(report.counts.negative, 1);
    assert_eq!(report.counts.neutral, 1);
    assert_eq!(models.requested(), vec![ModelBackend::Transformer]);
}

#[tokio::test]
async fn voice_is_transcribed_then_analyzed() {
    let (analyzer, models) = stub_analyzer(&[], "this is a great recording");

    let analysis = analyzer.analyze_voice(b"RIFF....WAVE").await.unwrap();

    assert_eq!(analysis.transcript, "this is a great recording");
    assert_eq!(analysis.classification.label, SentimentLabel::Positive);
    assert_eq!(analysis.emotion.label, "joy");
    assert_eq!(models.requested(), vec![ModelBackend::Transformer]);
}

#[tokio::test]
async fn unclear_audio_sentinel_is_still_classified() {
    let (analyzer, _) = stub_analyzer(&[], tenor::speech::AUDIO_NOT_CLEAR);

    let analysis = analyzer.analyze_voice(b"").await.unwrap();
    assert_eq!(analysis.transcript, tenor::speech::AUDIO_NOT_CLEAR);
    assert_eq!(analysis.classification.label, SentimentLabel::Neutral);
}

#[tokio::test]
async fn csv_without_text_column_is_rejected() {
    let (analyzer, models) = stub_analyzer(&[], "");

    let err = analyzer
        .analyze_csv("id,body\n1,great\n".as_bytes())
        .await
        .unwrap_err();

    assert!(err.downcast_ref::<MissingTextColumn>().is_some());
    assert_eq!(err.to_string(), "CSV must contain a 'text' column");
    assert!(models.requested().is_empty());
}

#[tokio::test]
async fn csv_rows_keep_order_and_columns() {
    let (analyzer, _) = stub_analyzer(&[], "");
    let input = "id,text,source\n\
                 1,great product,web\n\
                 2,,email\n\
                 3,bad support,phone\n\
                 4,\"plain, with comma\",web\n";

    let table = analyzer.analyze_csv(input.as_bytes()).await.unwrap();

    assert_eq!(
        table.headers,
        vec!["id", "text", "source", "Sentiment", "Emotion"]
    );
    let ids: Vec<&str> = table.rows.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4"]);

    let sentiments: Vec<&str> = table.rows.iter().map(|r| r[3].as_str()).collect();
    assert_eq!(sentiments, vec!["Positive", "Neutral", "Negative", "Neutral"]);

    let emotions: Vec<&str> = table.rows.iter().map(|r| r[4].as_str()).collect();
    assert_eq!(emotions, vec!["joy", "neutral", "neutral", "neutral"]);
    assert_eq!(table.rows[3][1], "plain, with comma");
}

#[tokio::test]
async fn csv_short_rows_are_padded() {
    let (analyzer, _) = stub_analyzer(&[], "");

    let table = analyzer
        .analyze_csv("text,note\ngreat\n".as_bytes())
        .await
        .unwrap();
    assert_eq!(table.rows, vec![vec!["great", "", "Positive", "joy"]]);
}

#[tokio::test]
async fn csv_rows_wider_than_the_header_are_rejected() {
    let (analyzer, models) = stub_analyzer(&[], "");

    let err = analyzer
        .analyze_csv("id,text\n1,fine\n2,hi,extra\n".as_bytes())
        .await
        .unwrap_err();

    assert_eq!(
        err.downcast_ref::<RaggedRow>(),
        Some(&RaggedRow {
            line: 3,
            expected: 2,
            found: 3
        })
    );
    assert_eq!(err.to_string(), "Expected 2 fields in line 3, saw 3");
    assert!(models.requested().is_empty());
}
