use std::path::Path;

use nc_news::db::{self, Pool};
use nc_news::model::{ArticleQuery, NewArticleInput, NewCommentInput, NewTopicInput};
use nc_news::seed::{self, SeedData};
use nc_news::ModelError;
use serde_json::json;
use tempfile::TempDir;

async fn setup() -> (TempDir, Pool) {
    let td = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}/news.db", td.path().display());
    let pool = db::init_pool(&url, 4).await.unwrap();
    db::run_migrations(&pool).await.unwrap();

    let fixture = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/test_data.json");
    let data = SeedData::from_json_file(&fixture).await.unwrap();
    seed::seed(&pool, &data).await.unwrap();
    (td, pool)
}

async fn count(pool: &Pool, sql: &str) -> i64 {
    sqlx::query_scalar(sql).fetch_one(pool).await.unwrap()
}

#[tokio::test]
async fn comment_count_matches_live_comments_for_every_article() {
    let (_td, pool) = setup().await;
    for article_id in 1..=13 {
        let article = db::select_article_by_id(&pool, article_id).await.unwrap();
        let expected: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE article_id = ?")
            .bind(article_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(article.comment_count, expected, "article {article_id}");
    }
}

#[tokio::test]
async fn missing_keys_are_404_across_operations() {
    let (_td, pool) = setup().await;
    let results: Vec<ModelError> = vec![
        db::check_article_exists(&pool, 404).await.unwrap_err(),
        db::select_article_by_id(&pool, 404).await.unwrap_err(),
        db::update_article_votes(&pool, 404, &json!(1)).await.unwrap_err(),
        db::remove_article(&pool, 404).await.unwrap_err(),
        db::select_comments_by_article(&pool, 404, &json!(null), &json!(null))
            .await
            .unwrap_err(),
        db::update_comment_votes(&pool, 404, &json!(1)).await.unwrap_err(),
        db::remove_comment(&pool, 404).await.unwrap_err(),
        db::select_user_by_username(&pool, "nobody").await.unwrap_err(),
        db::select_articles(
            &pool,
            &ArticleQuery {
                topic: Some("nothing".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err(),
    ];
    for err in results {
        assert_eq!(err.status(), 404, "{err:?}");
    }
}

#[tokio::test]
async fn pagination_total_count_ignores_page() {
    let (_td, pool) = setup().await;
    let all = db::select_articles(
        &pool,
        &ArticleQuery {
            limit: Some(100),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let page = db::select_articles(
        &pool,
        &ArticleQuery {
            limit: Some(5),
            p: Some(2),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(page.total_count, all.total_count);
    assert_eq!(page.articles, all.articles[5..10].to_vec());
}

#[tokio::test]
async fn article_lifecycle() {
    let (_td, pool) = setup().await;

    let topic = db::insert_topic(
        &pool,
        &NewTopicInput {
            slug: json!("coding"),
            description: json!("Code is love, code is life"),
        },
    )
    .await
    .unwrap();
    assert_eq!(topic.slug, "coding");

    let article = db::insert_article(
        &pool,
        &NewArticleInput {
            author: json!("rogersop"),
            title: json!("Running a Node App"),
            body: json!("This is part two of a series."),
            topic: json!("coding"),
            article_img_url: json!("https://example.com/node.png"),
        },
    )
    .await
    .unwrap();
    assert_eq!(article.comment_count, 0);

    let comment = db::insert_comment_by_article(
        &pool,
        article.article_id,
        &NewCommentInput {
            username: json!("butter_bridge"),
            body: json!("Great read"),
        },
    )
    .await
    .unwrap();
    db::update_comment_votes(&pool, comment.comment_id, &json!(4))
        .await
        .unwrap();

    let listed = db::select_articles(
        &pool,
        &ArticleQuery {
            topic: Some("coding".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(listed.total_count, 1);
    assert_eq!(listed.articles[0].comment_count, 1);

    db::remove_article(&pool, article.article_id).await.unwrap();
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM comments WHERE article_id = 14").await,
        0
    );
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM articles WHERE article_id = 14").await,
        0
    );
}

#[tokio::test]
async fn duplicate_title_leaves_table_unchanged() {
    let (_td, pool) = setup().await;
    let before = count(&pool, "SELECT COUNT(*) FROM articles").await;
    let err = db::insert_article(
        &pool,
        &NewArticleInput {
            author: json!("rogersop"),
            title: json!("Z"),
            body: json!("again"),
            topic: json!("mitch"),
            article_img_url: json!("https://example.com/z.png"),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ModelError::AlreadyExists(_)));
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM articles").await, before);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_removals_delete_once() {
    let (_td, pool) = setup().await;
    let (a, b) = tokio::join!(db::remove_article(&pool, 1), db::remove_article(&pool, 1));
    let loser = match (a, b) {
        (Ok(()), Err(err)) | (Err(err), Ok(())) => err,
        other => panic!("expected exactly one removal to succeed, got {other:?}"),
    };
    assert_eq!(loser.status(), 404, "{loser:?}");
    assert_eq!(loser.msg(), "Article Not Found");
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM articles WHERE article_id = 1").await,
        0
    );
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM comments WHERE article_id = 1").await,
        0
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_vote_increments_are_not_lost() {
    let (_td, pool) = setup().await;
    let before = db::select_article_by_id(&pool, 3).await.unwrap().votes;
    let one = json!(1);
    let results =
        futures::future::join_all((0..8).map(|_| db::update_article_votes(&pool, 3, &one))).await;
    for result in &results {
        assert!(result.is_ok(), "{result:?}");
    }
    let after = db::select_article_by_id(&pool, 3).await.unwrap().votes;
    assert_eq!(after - before, 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writes_to_different_articles_all_succeed() {
    let (_td, pool) = setup().await;
    let one = json!(1);
    let results = futures::future::join_all(
        (1..=8).map(|article_id| db::update_article_votes(&pool, article_id, &one)),
    )
    .await;
    for result in &results {
        assert!(result.is_ok(), "{result:?}");
    }
    assert_eq!(
        count(&pool, "SELECT SUM(votes) FROM articles WHERE article_id BETWEEN 1 AND 8").await,
        108
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_mixed_writes_serialize() {
    let (_td, pool) = setup().await;
    let input = NewCommentInput {
        username: json!("lurker"),
        body: json!("queued"),
    };
    let inc_votes = json!(-1);
    let (comment, voted, removed) = tokio::join!(
        db::insert_comment_by_article(&pool, 2, &input),
        db::update_comment_votes(&pool, 1, &inc_votes),
        db::remove_comment(&pool, 2),
    );
    comment.unwrap();
    assert_eq!(voted.unwrap().votes, 15);
    removed.unwrap();
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM comments").await, 18);
}
