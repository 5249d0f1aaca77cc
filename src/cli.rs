use book_catalog_common::{Entry, EntryId, genres_from_input};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "book-catalog")]
#[command(about = "蔵書カタログのクライアント", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 接続先URL（設定ファイル・環境変数より優先）
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// 出力形式 (text/json)
    #[arg(long, default_value = "text", global = true)]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 蔵書一覧を表示
    List {
        /// タイトル・著者・ジャンルで絞り込み
        #[arg(short, long)]
        search: Option<String>,
    },

    /// 1冊の詳細を表示
    Show {
        /// 本のID
        #[arg(required = true)]
        id: String,
    },

    /// 本を登録
    Add {
        #[command(flatten)]
        entry: EntryArgs,
    },

    /// 本を更新
    Update {
        /// 本のID
        #[arg(required = true)]
        id: String,

        #[command(flatten)]
        entry: EntryArgs,
    },

    /// 本を削除
    Remove {
        /// 本のID
        #[arg(required = true)]
        id: String,
    },

    /// 設定を表示/編集
    Config {
        /// 接続先URLを設定
        #[arg(long)]
        set_url: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

/// 登録・更新フォームの入力
#[derive(Args, Clone, Debug)]
pub struct EntryArgs {
    /// タイトル
    #[arg(short, long)]
    pub name: String,

    /// 著者
    #[arg(short, long)]
    pub author: String,

    /// 表紙画像URL
    #[arg(long)]
    pub img: Option<String>,

    /// ジャンル（カンマ区切り）
    #[arg(short, long)]
    pub genres: Option<String>,

    /// 評価 (0-5)
    #[arg(long)]
    pub stars: Option<u8>,

    /// 読了済み
    #[arg(long)]
    pub completed: bool,

    /// 読み始め (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<String>,

    /// 読み終わり (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<String>,
}

impl EntryArgs {
    /// 入力からレコードを組み立てる（IDは更新時のみ）
    pub fn to_entry(&self, id: Option<&str>) -> Entry {
        Entry {
            id: id.map(EntryId::from),
            img: self.img.clone().filter(|s| !s.trim().is_empty()),
            genres: self.genres.as_deref().map(genres_from_input).unwrap_or_default(),
            stars: self.stars,
            completed: self.completed,
            start: self.start.clone(),
            end: self.end.clone(),
            ..Entry::new(self.name.clone(), self.author.clone())
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "t" => Ok(OutputFormat::Text),
            "json" | "j" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
