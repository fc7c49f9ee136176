mod common;

use common::{entry, service, ScriptedClassifier, StaticFeed};
use std::sync::atomic::Ordering;
use ticker_sentiment::analysis_service::{aggregate, AnalysisError};
use ticker_sentiment::data_structures::{AnalysisOutcome, NoArticlesReason, SentimentLabel};
use ticker_sentiment::feed::FeedBatch;

fn completed(outcome: AnalysisOutcome) -> ticker_sentiment::data_structures::AnalysisReport {
    match outcome {
        AnalysisOutcome::Completed(report) => report,
        other => panic!("expected completed analysis, got {:?}", other),
    }
}

#[tokio::test]
async fn mixed_articles_average_to_positive_at_boundary() {
    let feed = StaticFeed::new(vec![
        entry("Boeing results", "Boeing had a great quarter"),
        entry("Boeing guidance", "Boeing missed targets"),
    ]);
    let classifier = ScriptedClassifier::new(&[
        ("Boeing had a great quarter", SentimentLabel::Positive, 0.9),
        ("Boeing missed targets", SentimentLabel::Negative, 0.6),
    ]);
    let (service, _, _) = service(feed, classifier);

    let report = completed(service.analyze("ba", Some("boeing")).await.unwrap());

    assert_eq!(report.ticker, "BA");
    assert_eq!(report.keyword.as_deref(), Some("boeing"));
    assert_eq!(report.articles.len(), 2);
    assert_eq!(report.aggregate.overall_label, SentimentLabel::Positive);
    assert_eq!(report.aggregate.overall_score, 0.15);
    assert_eq!(report.aggregate.scored_articles, 2);
    assert_eq!(report.distribution.positive, 1);
    assert_eq!(report.distribution.negative, 1);
}

#[tokio::test]
async fn articles_keep_feed_order_and_neutral_is_listed_but_unscored() {
    let feed = StaticFeed::new(vec![
        entry("first", "Shares slump on recall"),
        entry("second", "Annual meeting scheduled"),
        entry("third", "Orders surge"),
    ]);
    let classifier = ScriptedClassifier::new(&[
        ("Shares slump on recall", SentimentLabel::Negative, 0.95),
        ("Annual meeting scheduled", SentimentLabel::Neutral, 0.88),
        ("Orders surge", SentimentLabel::Positive, 0.12345),
    ]);
    let (service, _, classifier) = service(feed, classifier);

    let report = completed(service.analyze("BA", None).await.unwrap());

    let titles: Vec<_> = report.articles.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["first", "second", "third"]);
    assert_eq!(report.articles[1].label, SentimentLabel::Neutral);
    assert_eq!(report.articles[1].confidence, 0.88);
    assert_eq!(report.articles[2].confidence, 0.12345);
    assert_eq!(report.articles[2].display_confidence(), 0.123);

    // (-0.95 + 0.12345) / 2 = -0.413275
    assert_eq!(report.aggregate.scored_articles, 2);
    assert_eq!(report.aggregate.overall_score, -0.413);
    assert_eq!(report.aggregate.overall_label, SentimentLabel::Negative);

    let seen = classifier.seen.lock().unwrap().clone();
    assert_eq!(seen, vec!["Shares slump on recall", "Annual meeting scheduled", "Orders surge"]);
}

#[tokio::test]
async fn all_neutral_articles_give_zero_score() {
    let feed = StaticFeed::new(vec![entry("a", "alpha"), entry("b", "beta")]);
    let classifier = ScriptedClassifier::new(&[
        ("alpha", SentimentLabel::Neutral, 0.7),
        ("beta", SentimentLabel::Neutral, 0.9),
    ]);
    let (service, _, _) = service(feed, classifier);

    let report = completed(service.analyze("BA", None).await.unwrap());
    assert_eq!(report.aggregate.overall_score, 0.0);
    assert_eq!(report.aggregate.overall_label, SentimentLabel::Neutral);
    assert_eq!(report.aggregate.scored_articles, 0);
    assert_eq!(report.distribution.neutral, 2);
}

#[tokio::test]
async fn keyword_without_matches_reports_no_articles() {
    let feed = StaticFeed::new(vec![entry("a", "Boeing news"), entry("b", "Airbus news")]);
    let classifier = ScriptedClassifier::new(&[]);
    let (service, _, classifier) = service(feed, classifier);

    let outcome = service.analyze("BA", Some("XYZ123")).await.unwrap();
    match outcome {
        AnalysisOutcome::NoArticles { ticker, keyword, reason } => {
            assert_eq!(ticker, "BA");
            assert_eq!(keyword.as_deref(), Some("xyz123"));
            assert_eq!(reason, NoArticlesReason::NoKeywordMatch);
        }
        other => panic!("expected no articles, got {:?}", other),
    }
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn blank_keyword_keeps_every_article() {
    let feed = StaticFeed::new(vec![entry("a", "one"), entry("b", "two")]);
    let classifier = ScriptedClassifier::new(&[
        ("one", SentimentLabel::Positive, 0.5),
        ("two", SentimentLabel::Positive, 0.5),
    ]);
    let (service, _, _) = service(feed, classifier);

    let report = completed(service.analyze("BA", Some("   ")).await.unwrap());
    assert_eq!(report.keyword, None);
    assert_eq!(report.articles.len(), 2);
}

#[tokio::test]
async fn feed_failure_is_reported_as_no_articles() {
    let (service, feed, classifier) = service(StaticFeed::failing(), ScriptedClassifier::new(&[]));

    let outcome = service.analyze("ba", None).await.unwrap();
    match outcome {
        AnalysisOutcome::NoArticles {
            reason: NoArticlesReason::FeedUnavailable(detail),
            ..
        } => assert!(detail.contains("503")),
        other => panic!("expected feed failure, got {:?}", other),
    }
    assert_eq!(feed.requested.lock().unwrap().clone(), vec!["BA".to_string()]);
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_feed_is_reported_as_no_articles() {
    let mut feed = StaticFeed::new(Vec::new());
    feed.batch = FeedBatch {
        entries: Vec::new(),
        skipped: 3,
    };
    let (service, _, _) = service(feed, ScriptedClassifier::new(&[]));

    let outcome = service.analyze("BA", None).await.unwrap();
    assert!(matches!(
        outcome,
        AnalysisOutcome::NoArticles {
            reason: NoArticlesReason::EmptyFeed,
            ..
        }
    ));
}

#[tokio::test]
async fn skipped_entries_are_carried_into_report() {
    let mut feed = StaticFeed::new(Vec::new());
    feed.batch = FeedBatch {
        entries: vec![entry("a", "one")],
        skipped: 2,
    };
    let classifier = ScriptedClassifier::new(&[("one", SentimentLabel::Negative, 0.2)]);
    let (service, _, _) = service(feed, classifier);

    let report = completed(service.analyze("BA", None).await.unwrap());
    assert_eq!(report.skipped_entries, 2);
    assert_eq!(report.aggregate.overall_label, SentimentLabel::Negative);
}

#[tokio::test]
async fn classifier_failure_is_a_recoverable_error() {
    let feed = StaticFeed::new(vec![entry("known", "one"), entry("unknown", "two")]);
    let classifier = ScriptedClassifier::new(&[("one", SentimentLabel::Positive, 0.9)]);
    let (service, _, _) = service(feed, classifier);

    let err = service.analyze("BA", None).await.unwrap_err();
    match err {
        AnalysisError::Classifier { title, .. } => assert_eq!(title, "unknown"),
        other => panic!("expected classifier error, got {:?}", other),
    }
}

#[tokio::test]
async fn invalid_ticker_is_rejected_before_fetching() {
    let (service, feed, _) = service(StaticFeed::new(Vec::new()), ScriptedClassifier::new(&[]));

    let err = service.analyze("  ", None).await.unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidTicker(_)));
    assert!(feed.requested.lock().unwrap().is_empty());
}

#[tokio::test]
async fn reaggregating_report_is_stable_and_bounded() {
    let feed = StaticFeed::new(vec![
        entry("a", "one"),
        entry("b", "two"),
        entry("c", "three"),
    ]);
    let classifier = ScriptedClassifier::new(&[
        ("one", SentimentLabel::Positive, 1.0),
        ("two", SentimentLabel::Positive, 0.98),
        ("three", SentimentLabel::Neutral, 0.4),
    ]);
    let (service, _, _) = service(feed, classifier);

    let report = completed(service.analyze("BA", None).await.unwrap());
    let again = aggregate(&report.articles);

    assert_eq!(again, report.aggregate);
    assert!((-1.0..=1.0).contains(&report.aggregate.overall_score));
}

#[tokio::test]
async fn reaggregating_report_near_threshold_matches_pipeline() {
    let feed = StaticFeed::new(vec![entry("up", "great quarter"), entry("down", "missed targets")]);
    let classifier = ScriptedClassifier::new(&[
        ("great quarter", SentimentLabel::Positive, 0.9),
        ("missed targets", SentimentLabel::Negative, 0.6004),
    ]);
    let (service, _, _) = service(feed, classifier);

    let report = completed(service.analyze("BA", None).await.unwrap());

    // (0.9 - 0.6004) / 2 = 0.1498, just inside the dead zone
    assert_eq!(report.aggregate.overall_label, SentimentLabel::Neutral);
    assert_eq!(aggregate(&report.articles), report.aggregate);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["articles"][1]["confidence"], 0.6);
}
