use chanview_core::Link;
use url::Url;

use crate::store::PostNum;

/// Where following a link in a post leads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkTarget {
    /// A post on this imageboard.
    Post {
        board: String,
        thread: PostNum,
        post: PostNum,
    },
    External(Url),
}

impl LinkTarget {
    /// Classifies `link`, resolving relative targets against `base`.
    ///
    /// Reply links carry `data-thread`/`data-num` attributes; other same-origin links are
    /// recognised by their `/{board}/res/{thread}.html#{post}` path.
    pub fn classify(link: &Link, base: &Url) -> Option<Self> {
        let href = link.target.trim();
        let resolved = if href.is_empty() {
            None
        } else {
            base.join(href).ok()
        };

        if let Some(thread) = link.attr("data-thread").and_then(parse_num) {
            let post = link.attr("data-num").and_then(parse_num).unwrap_or(thread);
            let board = resolved
                .as_ref()
                .and_then(|url| board_of(url.path()))
                .map(str::to_string);
            if let Some(board) = board {
                return Some(Self::Post {
                    board,
                    thread,
                    post,
                });
            }
        }

        let url = resolved?;
        if url.origin() == base.origin()
            && let Some(target) = Self::from_thread_url(&url)
        {
            return Some(target);
        }
        match url.scheme() {
            "http" | "https" => Some(Self::External(url)),
            _ => None,
        }
    }

    fn from_thread_url(url: &Url) -> Option<Self> {
        let mut segments = url.path_segments()?;
        let board = segments.next().filter(|s| !s.is_empty())?;
        if segments.next()? != "res" {
            return None;
        }
        let file = segments.next()?;
        let thread = file
            .strip_suffix(".html")
            .or_else(|| file.strip_suffix(".json"))
            .and_then(parse_num)?;
        let post = url
            .fragment()
            .map(|f| f.trim_start_matches('p'))
            .and_then(parse_num)
            .unwrap_or(thread);
        Some(Self::Post {
            board: board.to_string(),
            thread,
            post,
        })
    }
}

fn parse_num(s: &str) -> Option<PostNum> {
    s.trim().parse().ok().map(PostNum)
}

fn board_of(path: &str) -> Option<&str> {
    path.trim_start_matches('/')
        .split('/')
        .next()
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://2ch.hk").unwrap()
    }

    fn link(target: &str, attrs: &[(&str, &str)]) -> Link {
        let mut link = Link::new(target);
        link.attrs = attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        link
    }

    #[test]
    fn reply_link_uses_data_attributes() {
        let l = link(
            "/b/res/100.html#105",
            &[("data-thread", "100"), ("data-num", "105")],
        );
        assert_eq!(
            LinkTarget::classify(&l, &base()),
            Some(LinkTarget::Post {
                board: "b".into(),
                thread: PostNum(100),
                post: PostNum(105),
            })
        );
    }

    #[test]
    fn thread_path_without_attributes() {
        let l = link("https://2ch.hk/sci/res/42.html#p43", &[]);
        assert_eq!(
            LinkTarget::classify(&l, &base()),
            Some(LinkTarget::Post {
                board: "sci".into(),
                thread: PostNum(42),
                post: PostNum(43),
            })
        );
        let l = link("/sci/res/42.html", &[]);
        assert!(matches!(
            LinkTarget::classify(&l, &base()),
            Some(LinkTarget::Post { post: PostNum(42), .. })
        ));
    }

    #[test]
    fn other_links_are_external() {
        let l = link("https://example.org/page", &[]);
        assert_eq!(
            LinkTarget::classify(&l, &base()),
            Some(LinkTarget::External(Url::parse("https://example.org/page").unwrap()))
        );
        let l = link("/b/catalog.html", &[]);
        assert!(matches!(
            LinkTarget::classify(&l, &base()),
            Some(LinkTarget::External(_))
        ));
        assert_eq!(LinkTarget::classify(&link("mailto:x@y", &[]), &base()), None);
        assert_eq!(LinkTarget::classify(&link("", &[]), &base()), None);
    }
}
