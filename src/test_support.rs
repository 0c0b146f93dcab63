//! Local HTTP servers and feed fixtures shared by the unit tests.

use axum::Router;

pub const RSS_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>Example News</title>
    <link>https://news.example.com</link>
    <description>Example feed</description>
    <item>
      <title>First best</title>
      <link>https://news.example.com/first</link>
      <description><![CDATA[<p>Hello <b>World</b></p>]]></description>
      <pubDate>Tue, 24 Feb 2026 10:00:00 +0000</pubDate>
      <enclosure url="https://cdn.example.com/first.jpg" type="image/jpeg" length="1234"/>
    </item>
    <item>
      <title>Second</title>
      <link>https://news.example.com/second</link>
      <description>Second summary</description>
      <pubDate>Mon, 23 Feb 2026 09:00:00 GMT</pubDate>
      <media:thumbnail url="https://cdn.example.com/second-thumb.jpg"/>
    </item>
    <item>
      <title>No link here</title>
      <description>Dropped</description>
    </item>
  </channel>
</rss>
"#;

pub const ATOM_FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Example</title>
  <id>urn:example:feed</id>
  <updated>2026-02-23T08:30:00Z</updated>
  <entry>
    <title>Atom post</title>
    <id>urn:example:post</id>
    <link rel="alternate" href="https://atom.example.com/post"/>
    <link rel="enclosure" type="image/png" href="https://atom.example.com/cover.png"/>
    <updated>2026-02-23T08:30:00Z</updated>
    <summary>Atom summary</summary>
  </entry>
</feed>
"#;

/// Build a minimal RSS document from `(title, link, pubDate)` triples.
pub fn rss_feed(items: &[(&str, &str, &str)]) -> String {
    let items: String = items
        .iter()
        .map(|(title, link, pub_date)| {
            format!(
                "<item><title>{title}</title><link>{link}</link>\
                 <description>About {title}</description><pubDate>{pub_date}</pubDate></item>"
            )
        })
        .collect();
    format!(
        "<?xml version=\"1.0\"?><rss version=\"2.0\"><channel><title>Feed</title>\
         <link>https://feed.example.com</link><description>Feed</description>{items}</channel></rss>"
    )
}

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn spawn_server(app: Router) -> (String, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let address = listener.local_addr().expect("local addr should exist");
    let join_handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server should run");
    });
    (format!("http://{address}"), join_handle)
}

/// One-item RSS document whose only media is an audio enclosure.
pub fn podcast_feed(link: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?><rss version=\"2.0\"><channel><title>Pod</title>\
         <link>https://pod.example.com</link><description>Episodes</description>\
         <item><title>Episode 1</title><link>{link}</link>\
         <description>Listen</description><pubDate>Tue, 24 Feb 2026 10:00:00 GMT</pubDate>\
         <enclosure url=\"https://cdn.example.com/ep1.mp3\" type=\"audio/mpeg\" length=\"9000\"/>\
         </item></channel></rss>"
    )
}
