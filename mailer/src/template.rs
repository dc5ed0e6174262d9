//! Verification message bodies shared by the HTTP and SMTP senders.

pub(crate) fn render_text(username: &str, link: &str, ttl_secs: u64) -> String {
    format!(
        "Hello {username},\n\nConfirm your Wordrop subscription by opening this link:\n{link}\n\nThe link expires in {}.\n",
        describe_ttl(ttl_secs)
    )
}

pub(crate) fn render_html(username: &str, link: &str, ttl_secs: u64) -> String {
    let username = escape_html(username);
    let link = escape_html(link);
    format!(
        "<p>Hello {username},</p>\
         <p>Confirm your Wordrop subscription by clicking the link below.</p>\
         <p><a href=\"{link}\">Verify my email</a></p>\
         <p>The link expires in {}.</p>",
        describe_ttl(ttl_secs)
    )
}

fn describe_ttl(secs: u64) -> String {
    let (value, unit) = if secs >= 3600 && secs % 3600 == 0 {
        (secs / 3600, "hour")
    } else if secs >= 60 && secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };
    if value == 1 {
        format!("1 {unit}")
    } else {
        format!("{value} {unit}s")
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
