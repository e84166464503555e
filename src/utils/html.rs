/// Clean teacher-authored text (task titles, descriptions) using ammonia.
///
/// Whitelist-based: harmless formatting tags survive, `<script>` and
/// event-handler attributes are stripped before anything is stored.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
