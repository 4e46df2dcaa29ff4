/// Default junk patterns for the cleaning pipeline
///
/// A line whose lowercased text contains any of these substrings is treated
/// as advertisement, navigation, or author-bio boilerplate and dropped. The
/// list can be replaced wholesale from configuration.
pub const DEFAULT_JUNK_PATTERNS: &[&str] = &[
    "our website",
    "read more",
    "can send him leads at",
    "about author",
    "about the author",
    "image:",
    "disclosure:",
    "redeem now",
    "follow our",
    "our twitter",
    "twitter.com/",
    "follow him on twitter",
    "follow me",
    "thanks for reading",
    "please",
    "your inbox",
    "subscribe",
    "subscribing",
    "first name",
    "select your",
    "topics",
    "share article",
    "disclaimer",
    "image credit",
    "related posts",
    "related news",
    "related articles",
    "related image",
    "related:",
    "sign up",
    "sign in",
    "email address",
    "your email",
    "exclusive offers",
    "newsletter",
    "you may also like",
    "also like:",
    "banner",
    "privacy policy",
    "terms of services",
    "terms and conditions",
    "advertisement",
    "advertise",
    "you agree",
    "in this article",
    "by the author",
    "from author",
    "©",
    "about us",
    "write for us",
    "pixabay",
    "shutterstock",
    "informational purposes only",
    "not investment advice",
    "your deposit",
    "this link",
    "the link",
    "to register",
    "code to receive",
    "sponsored",
    "special offer",
    "submit a press release",
    "http",
    "featured image",
    "article image",
    "join now",
    "(@",
    "my website",
    "news writer",
    "his articles",
    "journalist",
    "contact:",
];
