//! Page selectors and injected scripts for the messaging surface.
//!
//! The page's element identifiers drift between releases, so every affordance
//! is looked up through an ordered list of alternatives.

/// How an element is located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    XPath(String),
    Css(String),
}

impl Locator {
    pub fn xpath(value: impl Into<String>) -> Self {
        Locator::XPath(value.into())
    }

    pub fn css(value: impl Into<String>) -> Self {
        Locator::Css(value.into())
    }

    /// WebDriver location strategy name.
    pub fn using(&self) -> &'static str {
        match self {
            Locator::XPath(_) => "xpath",
            Locator::Css(_) => "css selector",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Locator::XPath(v) | Locator::Css(v) => v,
        }
    }
}

/// Search box in the chat list; present only once logged in.
pub const SEARCH_BOX: &str = r#"//div[@contenteditable="true"][@data-tab="3"]"#;

/// Banners shown when the number is not on the service.
pub const INVALID_RECIPIENT: &[&str] = &[
    "//div[contains(text(), 'Phone number shared via url is invalid')]",
    "//div[contains(text(), 'Telefonnummer')]",
    "//div[contains(text(), 'not exist')]",
    r#"//div[contains(text(), "doesn't have WhatsApp")]"#,
];

/// Conversation message box, most common first.
pub const MESSAGE_BOX: &[&str] = &[
    r#"//footer//div[@contenteditable="true"]"#,
    r#"//div[@contenteditable="true"][@data-tab="10"]"#,
    r#"//div[@contenteditable="true"][@data-tab="1"]"#,
    r#"//div[@role="textbox"][@contenteditable="true"]"#,
    r#"//div[@title="Type a message"]"#,
];

/// Attach (paper clip) control.
pub const ATTACH_BUTTON: &[&str] = &[
    r#"[data-testid="clip"]"#,
    r#"[data-icon="clip"]"#,
    r#"span[data-testid="clip"]"#,
    r#"button[aria-label="Attach"]"#,
    r#"div[title="Attach"]"#,
];

/// File inputs that accept images directly.
pub const IMAGE_INPUT: &[&str] = &[
    r#"input[accept*="image"]"#,
    r#"input[type="file"][accept*="image"]"#,
];

/// Menu entries that reveal an image input when clicked.
pub const PHOTO_MENU_ENTRY: &[&str] = &[
    r#"li[data-testid="mi-attach-photo"]"#,
    r#"button[aria-label="Photos & Videos"]"#,
];

/// Any file input, used after clicking a menu entry.
pub const ANY_FILE_INPUT: &str = r#"input[type="file"]"#;

/// Elements that show the media preview has loaded.
pub const MEDIA_PREVIEW: &[&str] = &[
    r#"[data-testid="media-viewer"]"#,
    r#"[data-testid="send-container"]"#,
    r#"div[data-testid="send"]"#,
    r#"div[aria-placeholder="Add a caption..."]"#,
];

/// Caption box on the media preview.
pub const CAPTION_BOX: &[&str] = &[
    r#"div[contenteditable="true"][data-tab="10"]"#,
    r#"div[aria-placeholder="Add a caption..."]"#,
    r#"div[data-testid="media-caption-input"]"#,
];

/// Send control on the media preview.
pub const SEND_BUTTON: &[&str] = &[
    r#"span[data-testid="send"]"#,
    r#"button[data-testid="send"]"#,
    r#"[aria-label="Send"]"#,
];

/// Id of the file input injected by [`CREATE_HIDDEN_INPUT`].
pub const HIDDEN_INPUT_ID: &str = "hidden-file-input";

/// Replaces any earlier hidden input with a fresh one.
pub const CREATE_HIDDEN_INPUT: &str = r#"
var existing = document.querySelectorAll('input[id="hidden-file-input"]');
existing.forEach(function(input) { input.remove(); });
var input = document.createElement('input');
input.type = 'file';
input.id = 'hidden-file-input';
input.accept = 'image/*,video/mp4,video/3gpp,video/quicktime';
input.style.display = 'none';
input.multiple = false;
document.body.appendChild(input);
return 'input_created';
"#;

/// Dispatches a synthetic drag-and-drop of the hidden input's file.
pub const TRIGGER_DROP: &str = r#"
var input = document.getElementById('hidden-file-input');
if (!input || !input.files || input.files.length === 0) { return 'no_file_found'; }
var target = document.querySelector('#main') ||
             document.querySelector('[data-testid="conversation-panel-messages"]');
if (!target) { return 'no_drop_target'; }
var dt = new DataTransfer();
dt.items.add(input.files[0]);
['dragenter', 'dragover', 'drop'].forEach(function(type) {
  target.dispatchEvent(new DragEvent(type, { dataTransfer: dt, bubbles: true }));
});
return 'file_processed';
"#;

/// Dismisses menus and previews left open by a failed strategy.
pub const DISMISS_OVERLAYS: &str = r#"
document.dispatchEvent(new KeyboardEvent('keydown', { key: 'Escape', keyCode: 27, bubbles: true }));
var hidden = document.getElementById('hidden-file-input');
if (hidden) { hidden.remove(); }
return 'dismissed';
"#;

/// Hides the automation flag some pages check for.
pub const HIDE_WEBDRIVER_FLAG: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined}); return true;";

pub fn xpaths(values: &[&str]) -> Vec<Locator> {
    values.iter().map(|v| Locator::xpath(*v)).collect()
}

pub fn css_list(values: &[&str]) -> Vec<Locator> {
    values.iter().map(|v| Locator::css(*v)).collect()
}
