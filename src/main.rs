use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::{error, info};

use nc_news::config;
use nc_news::db::{self, Pool};
use nc_news::model::{ArticleQuery, NewArticleInput, NewCommentInput, NewTopicInput};
use nc_news::seed::{self, SeedData};
use nc_news::ModelResult;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending schema migrations and exit
    Migrate,
    /// Replace every table's contents with a JSON fixture
    Seed {
        #[arg(long)]
        data: PathBuf,
    },
    /// List all topics
    Topics,
    /// Create a topic
    PostTopic { slug: String, description: String },
    /// List articles, sorted and paginated
    Articles {
        #[arg(long)]
        sort_by: Option<String>,
        #[arg(long)]
        order: Option<String>,
        #[arg(long)]
        topic: Option<String>,
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long)]
        p: Option<i64>,
    },
    /// Show one article with its comment count
    Article { article_id: i64 },
    /// Create an article
    PostArticle {
        #[arg(long)]
        author: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
        #[arg(long)]
        topic: String,
        #[arg(long)]
        article_img_url: String,
    },
    /// Add to an article's votes (may be negative)
    VoteArticle {
        article_id: i64,
        #[arg(allow_hyphen_values = true)]
        inc_votes: String,
    },
    /// Delete an article and all its comments
    DeleteArticle { article_id: i64 },
    /// List every comment
    AllComments,
    /// List a page of an article's comments
    Comments {
        article_id: i64,
        #[arg(long)]
        limit: Option<String>,
        #[arg(long)]
        p: Option<String>,
    },
    /// Comment on an article
    PostComment {
        article_id: i64,
        username: String,
        body: String,
    },
    /// Add to a comment's votes (may be negative)
    VoteComment {
        comment_id: i64,
        #[arg(allow_hyphen_values = true)]
        inc_votes: String,
    },
    /// Delete a comment
    DeleteComment { comment_id: i64 },
    /// List users
    Users,
    /// Show one user
    User { username: String },
}

/// Command-line text as a JSON value: numbers stay numbers, anything else
/// is passed on as a string so the data layer decides whether it is valid.
fn loose(raw: Option<String>) -> Value {
    match raw {
        Some(raw) => serde_json::from_str::<Value>(&raw)
            .ok()
            .filter(Value::is_number)
            .unwrap_or(Value::String(raw)),
        None => Value::Null,
    }
}

async fn execute(pool: &Pool, command: Command) -> ModelResult<Value> {
    let value = match command {
        Command::Topics => json!(db::select_topics(pool).await?),
        Command::PostTopic { slug, description } => {
            let input = NewTopicInput {
                slug: json!(slug),
                description: json!(description),
            };
            json!(db::insert_topic(pool, &input).await?)
        }
        Command::Articles {
            sort_by,
            order,
            topic,
            limit,
            p,
        } => {
            let query = ArticleQuery {
                sort_by,
                order,
                topic,
                limit,
                p,
            };
            json!(db::select_articles(pool, &query).await?)
        }
        Command::Article { article_id } => json!(db::select_article_by_id(pool, article_id).await?),
        Command::PostArticle {
            author,
            title,
            body,
            topic,
            article_img_url,
        } => {
            let input = NewArticleInput {
                author: json!(author),
                title: json!(title),
                body: json!(body),
                topic: json!(topic),
                article_img_url: json!(article_img_url),
            };
            json!(db::insert_article(pool, &input).await?)
        }
        Command::VoteArticle {
            article_id,
            inc_votes,
        } => json!(db::update_article_votes(pool, article_id, &loose(Some(inc_votes))).await?),
        Command::DeleteArticle { article_id } => {
            db::remove_article(pool, article_id).await?;
            Value::Null
        }
        Command::AllComments => json!(db::select_comments(pool).await?),
        Command::Comments {
            article_id,
            limit,
            p,
        } => json!(
            db::select_comments_by_article(pool, article_id, &loose(limit), &loose(p)).await?
        ),
        Command::PostComment {
            article_id,
            username,
            body,
        } => {
            let input = NewCommentInput {
                username: json!(username),
                body: json!(body),
            };
            json!(db::insert_comment_by_article(pool, article_id, &input).await?)
        }
        Command::VoteComment {
            comment_id,
            inc_votes,
        } => json!(db::update_comment_votes(pool, comment_id, &loose(Some(inc_votes))).await?),
        Command::DeleteComment { comment_id } => {
            db::remove_comment(pool, comment_id).await?;
            Value::Null
        }
        Command::Users => json!(db::select_users(pool).await?),
        Command::User { username } => json!(db::select_user_by_username(pool, &username).await?),
        Command::Migrate | Command::Seed { .. } => Value::Null,
    };
    Ok(value)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;

    let pool = db::init_pool(&cfg.database_url(), cfg.database.max_connections).await?;
    db::run_migrations(&pool).await?;

    let outcome = match args.command {
        Command::Migrate => {
            info!("migrations applied");
            Ok(Value::Null)
        }
        Command::Seed { data } => {
            let data = SeedData::from_json_file(&data).await?;
            seed::seed(&pool, &data).await?;
            Ok(Value::Null)
        }
        command => execute(&pool, command).await,
    };
    pool.close().await;

    match outcome {
        Ok(Value::Null) => {}
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(err) => {
            error!(%err, status = err.status(), "operation failed");
            println!("{}", serde_json::to_string_pretty(&err.body())?);
            std::process::exit(1);
        }
    }
    Ok(())
}
