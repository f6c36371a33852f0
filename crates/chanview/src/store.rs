use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;

use anyhow::Context;
use anyhow::Result;
use chanview_core::markup::plain_text;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::fetch::Endpoints;
use crate::fetch::Fetcher;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("unknown board /{0}/")]
    UnknownBoard(String),
    #[error("thread {thread} is not loaded on /{board}/")]
    UnknownThread { board: String, thread: PostNum },
    #[error("thread {thread} on /{board}/ has no posts")]
    EmptyThread { board: String, thread: PostNum },
    #[error("invalid post number {0:?}")]
    InvalidPostNumber(String),
}

/// Post number. The API sends it as a JSON number on some boards and a string on others.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "RawPostNum")]
pub struct PostNum(pub u64);

impl fmt::Display for PostNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPostNum {
    Int(u64),
    Str(String),
}

impl TryFrom<RawPostNum> for PostNum {
    type Error = StoreError;

    fn try_from(raw: RawPostNum) -> Result<Self, Self::Error> {
        match raw {
            RawPostNum::Int(n) => Ok(PostNum(n)),
            RawPostNum::Str(s) => s
                .trim()
                .parse()
                .map(PostNum)
                .map_err(|_| StoreError::InvalidPostNumber(s)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct PostPayload {
    num: PostNum,
    #[serde(default)]
    comment: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    timestamp: i64,
}

#[derive(Debug, Default, Deserialize)]
struct ThreadPayload {
    #[serde(default)]
    posts: Vec<PostPayload>,
}

#[derive(Debug, Default, Deserialize)]
struct ThreadsPayload {
    #[serde(default)]
    threads: Vec<ThreadPayload>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Post {
    pub subject: String,
    pub name: String,
    pub comment: String,
    pub timestamp: i64,
}

/// Post numbers of a thread, opening post first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Thread {
    pub posts: Vec<PostNum>,
}

#[derive(Clone, Debug, Default)]
pub struct Board {
    pub name: String,
    /// Threads of the last loaded index page, in server order.
    pub threads_index: Vec<PostNum>,
    pub threads: HashMap<PostNum, Thread>,
    pub posts: HashMap<PostNum, Post>,
}

/// In-memory cache of boards, threads and posts, filled from a [`Fetcher`].
pub struct ImageBoard {
    fetcher: Box<dyn Fetcher>,
    endpoints: Endpoints,
    boards: HashMap<String, Board>,
    categories: BTreeMap<String, Vec<String>>,
}

impl ImageBoard {
    pub fn new(fetcher: Box<dyn Fetcher>, endpoints: Endpoints) -> Self {
        Self {
            fetcher,
            endpoints,
            boards: HashMap::new(),
            categories: BTreeMap::new(),
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Category names in sorted order, each with its board ids in server order.
    pub fn categories(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.categories
            .iter()
            .map(|(cat, ids)| (cat.as_str(), ids.as_slice()))
    }

    pub fn board(&self, id: &str) -> Option<&Board> {
        self.boards.get(id)
    }

    fn board_mut(&mut self, id: &str) -> Result<&mut Board, StoreError> {
        self.boards
            .get_mut(id)
            .ok_or_else(|| StoreError::UnknownBoard(id.to_string()))
    }

    fn fetch<T: DeserializeOwned>(&self, url: url::Url) -> Result<T> {
        let bytes = self.fetcher.get_json(&url)?;
        serde_json::from_slice(&bytes).with_context(|| format!("parse json from {url}"))
    }

    /// Replaces everything known with a freshly fetched board catalog.
    pub fn load_catalog(&mut self) -> Result<()> {
        let catalog: BTreeMap<String, Vec<CatalogEntry>> = self.fetch(self.endpoints.catalog()?)?;

        self.boards.clear();
        self.categories.clear();
        for (category, entries) in catalog {
            let ids = entries
                .into_iter()
                .map(|entry| {
                    self.boards.insert(
                        entry.id.clone(),
                        Board {
                            name: entry.name,
                            ..Default::default()
                        },
                    );
                    entry.id
                })
                .collect();
            self.categories.insert(category, ids);
        }
        tracing::info!(
            categories = self.categories.len(),
            boards = self.boards.len(),
            "catalog loaded"
        );
        Ok(())
    }

    /// Loads the first index page of `board`, replacing its thread list.
    pub fn update_board(&mut self, board: &str) -> Result<()> {
        self.board_mut(board)?;
        let payload: ThreadsPayload = self.fetch(self.endpoints.board_index(board)?)?;

        let b = self.board_mut(board)?;
        let mut index = Vec::with_capacity(payload.threads.len());
        for thread in payload.threads {
            if let Some(num) = store_thread(b, thread.posts) {
                index.push(num);
            }
        }
        tracing::info!(board, threads = index.len(), "board index loaded");
        b.threads_index = index;
        Ok(())
    }

    /// Fetches every post of a thread. Returns the number of its opening post.
    pub fn update_thread(&mut self, board: &str, thread: PostNum) -> Result<PostNum> {
        self.board_mut(board)?;
        let payload: ThreadsPayload = self.fetch(self.endpoints.thread(board, thread)?)?;

        let b = self.board_mut(board)?;
        let posts = payload
            .threads
            .into_iter()
            .next()
            .map(|t| t.posts)
            .unwrap_or_default();
        let num = store_thread(b, posts).ok_or_else(|| StoreError::EmptyThread {
            board: board.to_string(),
            thread,
        })?;
        tracing::info!(board, %num, posts = b.threads[&num].posts.len(), "thread loaded");
        Ok(num)
    }

    /// Plain-text subjects of the indexed threads, in index order.
    ///
    /// A thread without a subject is listed by the start of its opening post.
    pub fn thread_subjects(&self, board: &str) -> Result<Vec<(PostNum, String)>, StoreError> {
        let b = self
            .boards
            .get(board)
            .ok_or_else(|| StoreError::UnknownBoard(board.to_string()))?;
        Ok(b.threads_index
            .iter()
            .map(|&num| (num, subject_line(num, b.posts.get(&num))))
            .collect())
    }

    /// Joins the posts of a thread into one markup document.
    pub fn render_thread(&self, board: &str, thread: PostNum) -> Result<String, StoreError> {
        let b = self
            .boards
            .get(board)
            .ok_or_else(|| StoreError::UnknownBoard(board.to_string()))?;
        let t = b.threads.get(&thread).ok_or_else(|| StoreError::UnknownThread {
            board: board.to_string(),
            thread,
        })?;

        let mut out = String::new();
        for num in &t.posts {
            let Some(post) = b.posts.get(num) else {
                continue;
            };
            out.push_str(&format!("<strong>{}</strong> #{num}<br>", post.name));
            out.push_str(&post.comment);
            out.push_str("<br><br>");
        }
        Ok(out)
    }
}

fn store_thread(board: &mut Board, posts: Vec<PostPayload>) -> Option<PostNum> {
    let op = posts.first()?.num;
    let mut thread = Thread {
        posts: Vec::with_capacity(posts.len()),
    };
    for p in posts {
        thread.posts.push(p.num);
        board.posts.insert(
            p.num,
            Post {
                subject: p.subject,
                name: p.name,
                comment: p.comment,
                timestamp: p.timestamp,
            },
        );
    }
    board.threads.insert(op, thread);
    Some(op)
}

const SUBJECT_FALLBACK_CHARS: usize = 80;

fn subject_line(num: PostNum, post: Option<&Post>) -> String {
    let Some(post) = post else {
        return format!("#{num}");
    };
    let subject = plain_text(&post.subject).unwrap_or_else(|_| post.subject.clone());
    let subject = subject.trim();
    if !subject.is_empty() {
        return subject.to_string();
    }

    let comment = plain_text(&post.comment).unwrap_or_default();
    let first = comment.lines().map(str::trim).find(|l| !l.is_empty());
    match first {
        Some(line) => line.chars().take(SUBJECT_FALLBACK_CHARS).collect(),
        None => format!("#{num}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_numbers_accept_ints_and_strings() {
        let n: PostNum = serde_json::from_str("42").unwrap();
        assert_eq!(n, PostNum(42));
        let n: PostNum = serde_json::from_str("\"43\"").unwrap();
        assert_eq!(n, PostNum(43));
        assert!(serde_json::from_str::<PostNum>("\"abc\"").is_err());
    }

    #[test]
    fn subject_falls_back_to_comment_then_number() {
        let post = Post {
            subject: "<strong>Hello</strong> &amp; bye".into(),
            ..Default::default()
        };
        assert_eq!(subject_line(PostNum(1), Some(&post)), "Hello & bye");

        let post = Post {
            comment: "<br>first line<br>second".into(),
            ..Default::default()
        };
        assert_eq!(subject_line(PostNum(1), Some(&post)), "first line");

        assert_eq!(subject_line(PostNum(7), Some(&Post::default())), "#7");
        assert_eq!(subject_line(PostNum(8), None), "#8");
    }

    #[test]
    fn empty_thread_payload_is_skipped() {
        let mut board = Board::default();
        assert_eq!(store_thread(&mut board, Vec::new()), None);
        assert!(board.threads.is_empty());
    }
}
