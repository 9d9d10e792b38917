use url::Url;

use crate::model::{Author, Post};

/// Public link to one post
pub fn post_url(base_url: &Url, username: &str, slug: &str) -> Url {
    let mut url = base_url.clone();
    url.set_path(&format!("{}/posts/{}", username, slug));
    url
}

/// Per-subscriber opt-out link, carrying the subscriber's email and the
/// author's public identifier
pub fn unsubscribe_url(base_url: &Url, username: &str, email: &str) -> Url {
    let mut url = base_url.clone();
    url.set_path(&format!("{}/newsletter/unsubscribe", username));
    url.query_pairs_mut().append_pair("email", email);
    url
}

/// Subscription confirmation link carrying the verification token
pub fn confirmation_url(base_url: &Url, username: &str, token: &str) -> Url {
    let mut url = base_url.clone();
    url.set_path(&format!("{}/newsletter/confirm", username));
    url.query_pairs_mut().append_pair("token", token);
    url
}

/// HTML body for one digest message
pub fn newsletter_html(
    author: &Author,
    posts: &[Post],
    base_url: &Url,
    unsubscribe: &Url,
) -> String {
    let mut sections = String::new();
    for post in posts {
        let link = post_url(base_url, &author.username, &post.slug);
        sections.push_str(&format!(
            "<div class=\"post\">\
             <h2>{}</h2>\
             <p><a href=\"{}\">Read the post</a></p>\
             </div><hr/>",
            post.title, link
        ));
    }

    format!(
        "<html><body>\
         <h1>{title}</h1>\
         <p>by {byline}</p>\
         <hr/>\
         {sections}\
         <footer>\
         <p>You are receiving this because you subscribed to {byline}'s newsletter.</p>\
         <p><a href=\"{unsubscribe}\">Unsubscribe</a></p>\
         </footer>\
         </body></html>",
        title = author.newsletter_subject(),
        byline = author.byline(),
        sections = sections,
        unsubscribe = unsubscribe,
    )
}

/// Plain-text alternative for the same digest
pub fn newsletter_text(
    author: &Author,
    posts: &[Post],
    base_url: &Url,
    unsubscribe: &Url,
) -> String {
    let mut body = format!("{} - by {}\n\n", author.newsletter_subject(), author.byline());
    for post in posts {
        let link = post_url(base_url, &author.username, &post.slug);
        body.push_str(&format!("* {}\n  {}\n", post.title, link));
    }
    body.push_str(&format!("\nUnsubscribe: {}\n", unsubscribe));
    body
}

/// HTML body for the subscription verification message
pub fn verification_html(author_name: &str, confirmation: &Url) -> String {
    format!(
        "<html><body>\
         <h1>Confirm your subscription</h1>\
         <p>Click the link below to start receiving {author_name}'s newsletter.</p>\
         <p><a href=\"{confirmation}\">Confirm subscription</a></p>\
         <p>If you did not request this, you can ignore this message.</p>\
         </body></html>",
    )
}

/// Plain-text alternative for the verification message
pub fn verification_text(author_name: &str, confirmation: &Url) -> String {
    format!(
        "Confirm your subscription to {author_name}'s newsletter:\n{confirmation}\n\n\
         If you did not request this, you can ignore this message.\n",
    )
}
