//! End-to-end checks of the dashboard pipeline over the sample upload.

use socialdash_analytics::{
    add_total_engagement, assign_clusters, explorer_rows, read_posts, run_dashboard,
    summarize, AnalyticsError, Dashboard, DashboardContext, DashboardOutcome, Upload,
};
use socialdash_core::{PERFORMANCE_CLUSTER_COLUMN, TOTAL_ENGAGEMENT_COLUMN};

const SAMPLE: &str = include_str!("fixtures/posts.csv");

fn dashboard(bytes: &[u8], cluster_choice: u8) -> Dashboard {
    let ctx = DashboardContext {
        upload: Some(Upload::new(Some("posts.csv".to_string()), bytes.to_vec())),
        cluster_choice,
    };
    match run_dashboard(&ctx).expect("pipeline should succeed") {
        DashboardOutcome::Ready(dashboard) => *dashboard,
        DashboardOutcome::AwaitingUpload { .. } => panic!("upload was provided"),
    }
}

#[test]
fn export_decodes_to_the_explorer_table() {
    let dash = dashboard(SAMPLE.as_bytes(), 0);

    let mut reader = csv::Reader::from_reader(dash.export.as_slice());
    let headers: Vec<String> = reader
        .headers()
        .expect("header row")
        .iter()
        .map(str::to_string)
        .collect();
    let rows: Vec<Vec<String>> = reader
        .records()
        .map(|r| r.expect("record").iter().map(str::to_string).collect())
        .collect();

    assert_eq!(headers, dash.explorer.columns);
    assert_eq!(rows, dash.explorer.rows);
}

#[test]
fn export_columns_are_input_then_derived() {
    let dash = dashboard(SAMPLE.as_bytes(), 0);
    let input: Vec<&str> = SAMPLE
        .lines()
        .next()
        .expect("header")
        .split(',')
        .collect();

    let columns: Vec<&str> = dash.explorer.columns.iter().map(String::as_str).collect();
    assert_eq!(&columns[..input.len()], input.as_slice());
    assert_eq!(
        &columns[input.len()..],
        &[TOTAL_ENGAGEMENT_COLUMN, PERFORMANCE_CLUSTER_COLUMN]
    );
}

#[test]
fn reuploading_an_export_does_not_duplicate_derived_columns() {
    let first = dashboard(SAMPLE.as_bytes(), 0);
    let second = dashboard(&first.export, 0);
    assert_eq!(first.explorer.columns, second.explorer.columns);
    assert_eq!(second.summary.total_posts, first.summary.total_posts);
    assert_eq!(second.summary.total_likes, first.summary.total_likes);
    assert_eq!(second.summary.max_views, first.summary.max_views);
    assert_eq!(second.explorer.rows.len(), first.explorer.rows.len());
}

#[test]
fn explorer_is_non_increasing_in_engagement_rate() {
    let dash = dashboard(SAMPLE.as_bytes(), 0);
    let idx = dash
        .explorer
        .column_index("engagement_rate")
        .expect("column present");
    let rates: Vec<f64> = dash
        .explorer
        .rows
        .iter()
        .map(|r| r[idx].parse().expect("numeric"))
        .collect();
    assert!(rates.windows(2).all(|w| w[0] >= w[1]), "{rates:?}");
}

#[test]
fn total_engagement_column_matches_components() {
    let dash = dashboard(SAMPLE.as_bytes(), 0);
    let view = &dash.explorer;
    let col = |name: &str| view.column_index(name).expect("column present");
    let (likes, comments, shares, total) = (
        col("likes"),
        col("comments"),
        col("shares"),
        col(TOTAL_ENGAGEMENT_COLUMN),
    );
    for row in &view.rows {
        let sum: u64 = [likes, comments, shares]
            .iter()
            .map(|&i| row[i].parse::<u64>().expect("count"))
            .sum();
        assert_eq!(row[total].parse::<u64>().expect("count"), sum);
    }
}

#[test]
fn summary_matches_direct_recomputation() {
    let posts = read_posts(SAMPLE.as_bytes()).expect("valid sample");
    let summary = summarize(&posts).expect("non-empty");

    assert_eq!(summary.total_posts, posts.rows.len());
    assert_eq!(
        summary.total_likes,
        posts.rows.iter().map(|p| p.likes).sum::<u64>()
    );
    assert_eq!(
        Some(summary.max_views),
        posts.rows.iter().map(|p| p.views).max()
    );
    #[allow(clippy::cast_precision_loss)]
    let mean = posts.rows.iter().map(|p| p.engagement_rate).sum::<f64>() / posts.rows.len() as f64;
    assert!((summary.avg_engagement_rate - mean).abs() < 1e-12);
}

#[test]
fn clustering_is_deterministic_across_runs() {
    let labels = || {
        let posts = read_posts(SAMPLE.as_bytes()).expect("valid sample");
        assign_clusters(add_total_engagement(posts))
            .expect("clusterable")
            .rows
            .iter()
            .map(|r| r.performance_cluster)
            .collect::<Vec<u8>>()
    };
    let first = labels();
    assert_eq!(first, labels());
    assert!(first.iter().all(|&l| l < 3));
}

#[test]
fn cluster_views_partition_the_table() {
    let total: usize = (0..3)
        .map(|c| dashboard(SAMPLE.as_bytes(), c).cluster.table.rows.len())
        .sum();
    assert_eq!(total, 12);
}

#[test]
fn explorer_rows_follow_the_same_order_as_the_view() {
    let posts = read_posts(SAMPLE.as_bytes()).expect("valid sample");
    let table = assign_clusters(add_total_engagement(posts)).expect("clusterable");
    let first = explorer_rows(&table)[0];
    // Instagram reel, post 8, has the highest rate in the sample.
    assert_eq!(first.post.cells[0], "8");
}

#[test]
fn fewer_than_three_rows_fail_clustering() {
    let csv = "platform,post_type,likes,comments,shares,views,engagement_rate,post_length\n\
               TikTok,Video,10,2,1,100,0.05,20\n\
               Instagram,Reel,20,4,2,200,0.06,40\n";
    let ctx = DashboardContext {
        upload: Some(Upload::new(None, csv.as_bytes().to_vec())),
        cluster_choice: 0,
    };
    let err = run_dashboard(&ctx).unwrap_err();
    assert!(
        matches!(err, AnalyticsError::InsufficientClusterData { distinct: 2, k: 3 }),
        "got {err:?}"
    );
}

#[test]
fn header_only_upload_is_an_empty_table_error() {
    let csv = "platform,post_type,likes,comments,shares,views,engagement_rate,post_length\n";
    let ctx = DashboardContext {
        upload: Some(Upload::new(Some("empty.csv".to_string()), csv.as_bytes().to_vec())),
        cluster_choice: 0,
    };
    let err = run_dashboard(&ctx).unwrap_err();
    assert!(matches!(err, AnalyticsError::EmptyTable { .. }), "got {err:?}");
}
