use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::catalog::models::{AspectClass, Catalog, Category, VideoEntry};
use crate::gallery::rank::rank;
use crate::likes::LikeMap;

/// Characters `encodeURIComponent` leaves alone.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub const EMPTY_CATEGORY_MESSAGE: &str = "No videos in this category yet";

/// Everything the player overlay needs for one open session.
pub struct PlayerView<'a> {
    pub session_id: &'a str,
    pub category: Category,
    pub video: &'a VideoEntry,
    pub likes: u64,
    pub aspect: AspectClass,
}

/// Percent-encode each path segment, keeping the slashes.
pub fn encode_url(url: &str) -> String {
    url.split('/')
        .map(|segment| utf8_percent_encode(segment, COMPONENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Browser-facing source for a catalog url.
///
/// Relative urls are rooted at `/` so they resolve the same from every page;
/// absolute `http(s)://` urls keep their origin and only the path is encoded.
pub fn media_src(url: &str) -> String {
    if let Some(scheme_end) = url.find("://") {
        let path_start = url[scheme_end + 3..]
            .find('/')
            .map(|i| scheme_end + 3 + i)
            .unwrap_or(url.len());
        let (origin, path) = url.split_at(path_start);
        return format!("{}{}", escape_html(origin), encode_url(path));
    }
    format!("/{}", encode_url(url.trim_start_matches('/')))
}

fn encode_query_value(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn like_label(count: u64) -> String {
    if count > 0 {
        format!("Like ({})", count)
    } else {
        "Like".to_string()
    }
}

const STYLE: &str = r#"
        <style>
            body { font-family: Arial, sans-serif; margin: 0; padding: 20px; background-color: #f5f5f5; }
            h1 { color: #333; }
            a { text-decoration: none; color: inherit; }
            .tabs { display: flex; gap: 8px; margin-bottom: 12px; }
            .tab-button { padding: 8px 16px; border-radius: 16px; background: #e0e0e0; }
            .tab-button.active { background: #333; color: white; }
            .category-description { color: #555; margin-bottom: 20px; }
            .video-grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(240px, 1fr)); gap: 20px; }
            .video-card { display: block; background-color: white; border-radius: 8px; overflow: hidden; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
            .video-thumbnail-container { position: relative; background-color: #ccc; }
            .aspect-16-9 .video-thumbnail-container { aspect-ratio: 16 / 9; }
            .aspect-9-16 .video-thumbnail-container { aspect-ratio: 9 / 16; }
            .video-thumbnail { width: 100%; height: 100%; object-fit: cover; }
            .rank-badge { position: absolute; top: 8px; left: 8px; font-size: 28px; }
            .video-info { padding: 10px; }
            .video-title { margin: 5px 0; color: #333; font-weight: bold; }
            .video-description { color: #666; font-size: 14px; }
            .video-likes { color: #e91e63; margin-top: 6px; }
            .loading { grid-column: 1 / -1; text-align: center; color: #777; padding: 40px; }
            .reset-form { margin-top: 40px; text-align: right; }
            .modal { position: fixed; inset: 0; background: rgba(0,0,0,0.85); display: none; align-items: center; justify-content: center; }
            .modal.active { display: flex; }
            .modal-content { background: #111; color: white; padding: 16px; border-radius: 8px; position: relative; }
            .modal-content.aspect-16-9 video { width: 80vw; max-height: 75vh; }
            .modal-content.aspect-9-16 video { height: 75vh; }
            .close-button { position: absolute; top: 4px; right: 12px; font-size: 28px; cursor: pointer; background: none; border: none; color: white; }
            .like-button { margin-top: 10px; padding: 8px 16px; border-radius: 16px; border: none; cursor: pointer; }
            .like-button.liked { background: #e91e63; color: white; }
        </style>
"#;

const GALLERY_SCRIPT: &str = r#"
        <script>
            document.querySelectorAll('.video-card').forEach(function (card) {
                var video = card.querySelector('video');
                if (!video) return;
                var seekTime = parseFloat(card.dataset.thumbnailTime) || 2;
                var explicitRatio = card.dataset.aspectRatio === 'explicit';

                var observer = new IntersectionObserver(function (entries) {
                    entries.forEach(function (entry) {
                        if (!entry.isIntersecting) return;
                        var src = video.getAttribute('data-src');
                        if (src && !video.src) {
                            video.src = src;
                            video.preload = 'metadata';
                            video.addEventListener('loadedmetadata', function () {
                                if (!explicitRatio) {
                                    card.classList.remove('aspect-9-16', 'aspect-16-9');
                                    card.classList.add(video.videoWidth > video.videoHeight ? 'aspect-16-9' : 'aspect-9-16');
                                }
                                video.currentTime = seekTime;
                            });
                        }
                        observer.unobserve(video);
                    });
                }, { rootMargin: '50px' });
                observer.observe(video);

                card.addEventListener('mouseenter', function () {
                    if (video.src) video.play().catch(function () {});
                });
                card.addEventListener('mouseleave', function () {
                    if (video.src) {
                        video.pause();
                        video.currentTime = seekTime;
                    }
                });
            });
        </script>
"#;

fn page_head(title: &str) -> String {
    format!(
        r#"
    <!DOCTYPE html>
    <html>
    <head>
        <meta charset="utf-8">
        <title>{title}</title>
        {STYLE}
    </head>
    <body>
    "#,
        title = escape_html(title),
    )
}

const PAGE_TAIL: &str = r#"
    </body>
    </html>
"#;

/// Gallery page for one category, ranked against the given like snapshot.
pub fn render_gallery(active: Category, catalog: &Catalog, likes: &LikeMap) -> String {
    let mut html = page_head("Video Gallery");
    html.push_str("<h1>Video Gallery</h1>\n<nav class=\"tabs\">\n");

    for category in Category::ALL {
        let class = if category == active {
            "tab-button active"
        } else {
            "tab-button"
        };
        html.push_str(&format!(
            r#"<a class="{class}" data-category="{key}" href="/category/{key}">{label}</a>"#,
            key = category.key(),
            label = escape_html(category.label()),
        ));
        html.push('\n');
    }

    html.push_str(&format!(
        r#"</nav>
        <p class="category-description" id="categoryDescriptionText">{}</p>
        <div class="video-grid" id="videoGrid">
    "#,
        escape_html(active.description())
    ));

    let ranked = rank(catalog.videos(active), likes);
    if ranked.is_empty() {
        html.push_str(&format!(
            r#"<div class="loading">{}</div>"#,
            EMPTY_CATEGORY_MESSAGE
        ));
    }

    for (index, entry) in ranked.iter().enumerate() {
        let video = entry.video;

        let preview = match &video.thumbnail {
            Some(thumbnail) => format!(
                r#"<img src="{src}" alt="{alt}" class="video-thumbnail">"#,
                src = media_src(thumbnail),
                alt = escape_html(&video.title),
            ),
            None => format!(
                r#"<video class="video-thumbnail" data-src="{src}#t={time}" preload="none" muted loop></video>"#,
                src = media_src(&video.url),
                time = video.preview_time(),
            ),
        };

        let badge = entry
            .badge
            .map(|badge| {
                format!(
                    r#"<div class="rank-badge {}">{}</div>"#,
                    badge.css_class(),
                    badge.medal()
                )
            })
            .unwrap_or_default();

        html.push_str(&format!(
            r#"
            <a class="video-card {aspect}" data-video-index="{index}" data-thumbnail-time="{time}" data-aspect-ratio="{ratio}" href="/watch?url={query}">
                <div class="video-thumbnail-container">
                    {preview}
                    {badge}
                </div>
                <div class="video-info">
                    <div class="video-title">{title}</div>
                    <div class="video-description">{description}</div>
                    <div class="video-likes"><span class="like-icon">♥</span> <span class="like-count">{likes}</span></div>
                </div>
            </a>
        "#,
            aspect = AspectClass::for_entry(video).css_class(),
            time = video.preview_time(),
            ratio = if video.aspect_ratio.is_some() { "explicit" } else { "auto" },
            query = encode_query_value(&video.url),
            title = escape_html(&video.title),
            description = escape_html(&video.description),
            likes = entry.likes,
        ));
    }

    html.push_str(&format!(
        r#"
        </div>
        <form class="reset-form" method="post" action="/admin/reset" onsubmit="return confirm('Reset every like count to 0? This cannot be undone.');">
            <input type="hidden" name="category" value="{key}">
            <input type="password" name="password" placeholder="Password" required>
            <button type="submit" id="resetButton">Reset likes</button>
        </form>
    "#,
        key = active.key()
    ));

    html.push_str(GALLERY_SCRIPT);
    html.push_str(PAGE_TAIL);
    html
}

/// Full-screen overlay for one video with its like button.
pub fn render_player(view: &PlayerView<'_>) -> String {
    let video = view.video;
    let mut html = page_head(&video.title);

    html.push_str(&format!(
        r#"
        <div class="modal active" id="videoModal" data-session="{session}" data-category="{category}">
            <div class="modal-content {aspect}" data-aspect-ratio="{ratio}">
                <button class="close-button" type="button">&times;</button>
                <h2 id="modalTitle">{title}</h2>
                <video id="modalVideo" src="{src}" controls autoplay playsinline></video>
                <div>
                    <button class="like-button" id="likeButton" type="button">
                        <span class="heart">♡</span> <span class="like-text">{label}</span>
                    </button>
                </div>
            </div>
        </div>
    "#,
        session = escape_html(view.session_id),
        category = view.category.key(),
        aspect = view.aspect.css_class(),
        ratio = if video.aspect_ratio.is_some() { "explicit" } else { "auto" },
        title = escape_html(&video.title),
        src = media_src(&video.url),
        label = like_label(view.likes),
    ));

    html.push_str(
        r#"
        <script>
            (function () {
                var modal = document.getElementById('videoModal');
                var content = modal.querySelector('.modal-content');
                var player = document.getElementById('modalVideo');
                var likeButton = document.getElementById('likeButton');
                var session = modal.dataset.session;
                var back = '/category/' + modal.dataset.category;
                var closing = false;

                if (content.dataset.aspectRatio !== 'explicit') {
                    player.addEventListener('loadedmetadata', function () {
                        content.classList.remove('aspect-9-16', 'aspect-16-9');
                        content.classList.add(player.videoWidth > player.videoHeight ? 'aspect-16-9' : 'aspect-9-16');
                    }, { once: true });
                }

                likeButton.addEventListener('click', function () {
                    if (likeButton.classList.contains('liked')) return;
                    likeButton.classList.add('liked');
                    likeButton.querySelector('.heart').textContent = '♥';
                    var text = likeButton.querySelector('.like-text');
                    fetch('/watch/' + session + '/like', { method: 'POST' })
                        .then(function (res) { return res.json(); })
                        .then(function (data) {
                            text.textContent = 'Thank you!';
                            setTimeout(function () { text.textContent = 'Like (' + data.count + ')'; }, 1500);
                        })
                        .catch(function () {});
                });

                function close() {
                    if (closing) return;
                    closing = true;
                    player.pause();
                    player.removeAttribute('src');
                    fetch('/watch/' + session + '/close', { method: 'POST' })
                        .finally(function () { window.location.href = back; });
                }

                modal.querySelector('.close-button').addEventListener('click', close);
                modal.addEventListener('click', function (e) { if (e.target === modal) close(); });
                document.addEventListener('keydown', function (e) {
                    if (e.key === 'Escape' && modal.classList.contains('active')) close();
                });
            })();
        </script>
    "#,
    );

    html.push_str(PAGE_TAIL);
    html
}

/// Small standalone page with a link back to a category.
pub fn render_message(heading: &str, message: &str, back: Category) -> String {
    let mut html = page_head(heading);
    html.push_str(&format!(
        r#"
        <h1>{heading}</h1>
        <p>{message}</p>
        <p><a href="/category/{key}">Back to the gallery</a></p>
    "#,
        heading = escape_html(heading),
        message = escape_html(message),
        key = back.key(),
    ));
    html.push_str(PAGE_TAIL);
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::models::AspectRatio;

    fn catalog_with(videos: Vec<VideoEntry>) -> Catalog {
        let mut catalog = Catalog::empty();
        *catalog.videos_mut(Category::Category1) = videos;
        catalog
    }

    #[test]
    fn encodes_each_segment() {
        assert_eq!(
            encode_url("videos/category1/my clip#1.mp4"),
            "videos/category1/my%20clip%231.mp4"
        );
        assert_eq!(encode_url("videos/日本.mp4"), "videos/%E6%97%A5%E6%9C%AC.mp4");
    }

    #[test]
    fn media_sources_are_rooted() {
        assert_eq!(media_src("videos/category1/a b.mp4"), "/videos/category1/a%20b.mp4");
        assert_eq!(media_src("/videos/category1/a.mp4"), "/videos/category1/a.mp4");
        assert_eq!(
            media_src("https://cdn.example.com/videos/a b.mp4"),
            "https://cdn.example.com/videos/a%20b.mp4"
        );
        assert_eq!(media_src("http://cdn.example.com"), "http://cdn.example.com");
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn empty_category_shows_message_and_no_cards() {
        let html = render_gallery(Category::Category2, &Catalog::empty(), &LikeMap::new());
        assert!(html.contains(EMPTY_CATEGORY_MESSAGE));
        assert!(!html.contains("class=\"video-card"));
        assert!(html.contains(Category::Category2.description()));
    }

    #[test]
    fn cards_follow_ranked_order() {
        let catalog = catalog_with(vec![
            VideoEntry::new("b.mp4", "videos/category1/b.mp4"),
            VideoEntry::new("a.mp4", "videos/category1/a.mp4"),
        ]);
        let html = render_gallery(Category::Category1, &catalog, &LikeMap::new());

        let a = html.find(">a.mp4<").unwrap();
        let b = html.find(">b.mp4<").unwrap();
        assert!(a < b);
        assert!(!html.contains(r#"class="rank-badge"#));
        assert!(!html.contains(EMPTY_CATEGORY_MESSAGE));
    }

    #[test]
    fn liked_card_gets_gold_badge() {
        let catalog = catalog_with(vec![
            VideoEntry::new("a.mp4", "videos/category1/a.mp4"),
            VideoEntry::new("b.mp4", "videos/category1/b.mp4"),
        ]);
        let likes = LikeMap::from([("videos/category1/b.mp4".to_string(), 3)]);
        let html = render_gallery(Category::Category1, &catalog, &likes);

        assert_eq!(html.matches("rank-badge rank-1").count(), 1);
        assert!(!html.contains("rank-badge rank-2"));
        assert!(html.find(">b.mp4<").unwrap() < html.find(">a.mp4<").unwrap());
    }

    #[test]
    fn preview_uses_thumbnail_time_and_aspect() {
        let mut video = VideoEntry::new("wide", "videos/category1/wide clip.mp4");
        video.thumbnail_time = 3.5;
        video.aspect_ratio = Some(AspectRatio::Landscape);
        let html = render_gallery(Category::Category1, &catalog_with(vec![video]), &LikeMap::new());

        assert!(html.contains(r#"data-src="/videos/category1/wide%20clip.mp4#t=3.5""#));
        assert!(html.contains("video-card aspect-16-9"));
        assert!(html.contains(r#"data-aspect-ratio="explicit""#));
        assert!(html.contains("rootMargin: '50px'"));
    }

    #[test]
    fn still_thumbnail_replaces_video_preview() {
        let mut video = VideoEntry::new("still", "videos/category1/still.mp4");
        video.thumbnail = Some("thumbs/still.jpg".to_string());
        let html = render_gallery(Category::Category1, &catalog_with(vec![video]), &LikeMap::new());

        assert!(html.contains(r#"<img src="/thumbs/still.jpg""#));
        assert!(!html.contains("data-src="));
    }

    #[test]
    fn active_tab_is_marked() {
        let html = render_gallery(Category::Category3, &Catalog::empty(), &LikeMap::new());
        assert!(html.contains(r#"class="tab-button active" data-category="category3""#));
        assert_eq!(html.matches("tab-button active").count(), 1);
    }

    #[test]
    fn player_shows_current_count() {
        let video = VideoEntry::new("Intro", "videos/category1/Intro.mp4");
        let html = render_player(&PlayerView {
            session_id: "abc",
            category: Category::Category1,
            video: &video,
            likes: 4,
            aspect: AspectClass::Portrait,
        });

        assert!(html.contains("Like (4)"));
        assert!(html.contains(r#"data-session="abc""#));
        assert!(html.contains(r#"src="/videos/category1/Intro.mp4""#));
        assert!(html.contains("modal-content aspect-9-16"));
    }

    #[test]
    fn player_without_likes_shows_plain_label() {
        let video = VideoEntry::new("Intro", "videos/category1/Intro.mp4");
        let html = render_player(&PlayerView {
            session_id: "abc",
            category: Category::Category1,
            video: &video,
            likes: 0,
            aspect: AspectClass::Landscape,
        });
        assert!(html.contains(r#"<span class="like-text">Like</span>"#));
    }
}
