//! Document composition.
//!
//! Stage 2 of the pipeline. Stitches the article heading, a link back to the
//! source, the assembled body, the side panel and the aside into one fragment:
//!
//! ```text
//! <h1>Title</h1>
//! <p><a href="url" title="Title on World Anvil" target="_blank">url</a></p>
//! <div class="article-container page">
//!   <div class="article-content">{content}{body}</div>
//!   <hr>
//!   <div class="panel panel-default">{top}{main}{bottom}</div>   (if any zone)
//!   <aside><dl>{aside}</dl></aside>                              (if any relation)
//! </div>
//! ```
//!
//! The composed fragment has every `src=` turned into `data-src=`, so nothing
//! downstream can start fetching images before the sanitizer has rewritten
//! them.

use crate::assemble::Assembly;
use crate::i18n::Localize;
use crate::types::{Article, ImageRef};
use maud::{PreEscaped, html};
use regex::Regex;
use std::sync::LazyLock;

/// Attribute marker that becomes `data-src=`.
static SRC_ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\s)src=").expect("src attribute pattern is valid"));

/// Composed fragment plus the provisional featured image.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedDocument {
    pub content: String,
    /// Portrait or cover image; the sanitizer may still fill this in.
    pub image: Option<String>,
}

/// Compose the article fragment.
///
/// `label_key` is the localization key of the suffix appended to the source
/// link's tooltip ("on World Anvil").
pub fn compose(
    article: &Article,
    assembly: &Assembly,
    localizer: &dyn Localize,
    label_key: &str,
) -> ComposedDocument {
    let link_title = format!("{} {}", article.title, localizer.localize(label_key));
    let panel = &assembly.side_panel;

    let markup = html! {
        h1 { (article.title) }
        p {
            a href=(article.url) title=(link_title) target="_blank" { (article.url) }
        }
        div.article-container.page {
            div.article-content {
                (PreEscaped(&article.content))
                (PreEscaped(&assembly.body))
            }
            hr;
            @if !panel.is_empty() {
                div.panel.panel-default {
                    (PreEscaped(&panel.top))
                    (PreEscaped(&panel.main))
                    (PreEscaped(&panel.bottom))
                }
            }
            @if !assembly.aside.is_empty() {
                aside {
                    dl { (PreEscaped(&assembly.aside)) }
                }
            }
        }
    };

    ComposedDocument {
        content: defer_sources(&markup.into_string()),
        image: featured_image(article),
    }
}

/// Portrait first, then cover, both forced onto https.
pub fn featured_image(article: &Article) -> Option<String> {
    [&article.portrait, &article.cover]
        .into_iter()
        .flatten()
        .map(|image: &ImageRef| image.url.as_str())
        .find(|url| !url.is_empty())
        .map(force_https)
}

/// Upgrade a plain-http URL to https; other URLs pass through.
pub fn force_https(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    }
}

/// Rename every `src=` attribute to `data-src=`.
pub fn defer_sources(content: &str) -> String {
    SRC_ATTRIBUTE.replace_all(content, "${1}data-src=").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::SidePanel;
    use crate::test_helpers::*;

    fn town() -> Article {
        article("Town", "http://x/town")
    }

    #[test]
    fn empty_assembly_composes_bare_document() {
        let doc = compose(&town(), &Assembly::default(), &localizer(), "WA.OnWA");
        assert_eq!(
            doc.content,
            concat!(
                "<h1>Town</h1>",
                r#"<p><a href="http://x/town" title="Town on World Anvil" target="_blank">http://x/town</a></p>"#,
                r#"<div class="article-container page"><div class="article-content"></div><hr></div>"#
            )
        );
        assert_eq!(doc.image, None);
    }

    #[test]
    fn link_title_uses_localized_suffix() {
        let localizer = catalog(&[("WA.OnWA", "sur World Anvil")]);
        let doc = compose(&town(), &Assembly::default(), &localizer, "WA.OnWA");
        assert!(doc.content.contains(r#"title="Town sur World Anvil""#));
    }

    #[test]
    fn body_sits_inside_content_container() {
        let mut article = town();
        article.content = "<p>Intro</p>".to_string();
        let assembly = Assembly {
            body: "<h2>History</h2><p>Old.</p><hr>".to_string(),
            ..Assembly::default()
        };
        let doc = compose(&article, &assembly, &localizer(), "WA.OnWA");
        assert!(doc.content.contains(concat!(
            r#"<div class="article-content"><p>Intro</p><h2>History</h2><p>Old.</p><hr></div><hr>"#
        )));
    }

    #[test]
    fn panel_zones_render_top_main_bottom() {
        let assembly = Assembly {
            side_panel: SidePanel {
                top: "[top]".to_string(),
                main: "[main]".to_string(),
                bottom: "[bottom]".to_string(),
            },
            ..Assembly::default()
        };
        let doc = compose(&town(), &assembly, &localizer(), "WA.OnWA");
        assert!(doc.content.contains(r#"<hr><div class="panel panel-default">[top][main][bottom]</div></div>"#));
    }

    #[test]
    fn single_zone_still_gets_panel() {
        let assembly = Assembly {
            side_panel: SidePanel {
                bottom: "[bottom]".to_string(),
                ..SidePanel::default()
            },
            ..Assembly::default()
        };
        let doc = compose(&town(), &assembly, &localizer(), "WA.OnWA");
        assert!(doc.content.contains(r#"<div class="panel panel-default">[bottom]</div>"#));
    }

    #[test]
    fn aside_follows_panel() {
        let assembly = Assembly {
            side_panel: SidePanel {
                main: "[main]".to_string(),
                ..SidePanel::default()
            },
            aside: "<dt>Rulers:</dt><dd>Ada</dd>".to_string(),
            ..Assembly::default()
        };
        let doc = compose(&town(), &assembly, &localizer(), "WA.OnWA");
        assert!(doc.content.ends_with(
            r#"[main]</div><aside><dl><dt>Rulers:</dt><dd>Ada</dd></dl></aside></div>"#
        ));
    }

    #[test]
    fn no_panel_or_aside_when_empty() {
        let doc = compose(&town(), &Assembly::default(), &localizer(), "WA.OnWA");
        assert!(!doc.content.contains("panel"));
        assert!(!doc.content.contains("<aside>"));
    }

    #[test]
    fn image_sources_are_deferred() {
        let mut article = town();
        article.content = r#"<img src="/uploads/a.png"><img data-src="/b.png">"#.to_string();
        let doc = compose(&article, &Assembly::default(), &localizer(), "WA.OnWA");
        assert!(doc.content.contains(r#"<img data-src="/uploads/a.png">"#));
        assert!(doc.content.contains(r#"<img data-src="/b.png">"#));
        assert!(!doc.content.contains(" src="));
    }

    #[test]
    fn defer_sources_ignores_srcset_and_text() {
        assert_eq!(
            defer_sources(r#"<img srcset="a 1x" src="b">src=c"#),
            r#"<img srcset="a 1x" data-src="b">src=c"#
        );
    }

    #[test]
    fn portrait_wins_over_cover() {
        let mut article = town();
        article.portrait = Some(image_ref("http://img/p.png"));
        article.cover = Some(image_ref("http://img/c.png"));
        assert_eq!(featured_image(&article).as_deref(), Some("https://img/p.png"));
    }

    #[test]
    fn cover_is_used_without_portrait() {
        let mut article = town();
        article.cover = Some(image_ref("http://img/c.png"));
        assert_eq!(featured_image(&article).as_deref(), Some("https://img/c.png"));
    }

    #[test]
    fn empty_portrait_url_falls_through_to_cover() {
        let mut article = town();
        article.portrait = Some(image_ref(""));
        article.cover = Some(image_ref("https://img/c.png"));
        assert_eq!(featured_image(&article).as_deref(), Some("https://img/c.png"));
    }

    #[test]
    fn force_https_only_touches_http_prefix() {
        assert_eq!(force_https("http://a/b"), "https://a/b");
        assert_eq!(force_https("https://a/b"), "https://a/b");
        assert_eq!(force_https("/relative/http://x"), "/relative/http://x");
    }
}
