use ecsr::ItemDetail;

const FREE_MARKER: &str = "🟢";
const PAID_MARKER: &str = "🔴";

/// Renders an item as a Telegram Markdown message.
pub(crate) fn format_item(item: &ItemDetail, base_url: &str) -> String {
    let (marker, price) = match item.resolved_price() {
        Some(price) => (PAID_MARKER, price.to_string()),
        None => (FREE_MARKER, "Free".to_string()),
    };

    let offsale = match item.offsale_deadline.as_deref() {
        Some(deadline) if !deadline.is_empty() => format!("\n⏰ Offsale Deadline: {deadline}"),
        _ => String::new(),
    };

    format!(
        "{marker} *{name}*\n\
         🆔 ID: {id}\n\
         💰 Price: {price}\n\
         👤 Creator: {creator}\n\
         📛 Limited: {limited}\n\
         🔗 [Link]({base}/catalog/{id}/123)\
         {offsale}",
        name = item.name,
        id = item.id,
        creator = item.creator_name,
        limited = restriction_label(&item.item_restrictions),
        base = base_url.trim_end_matches('/'),
    )
}

/// Only an exact single-tag list counts as limited.
fn restriction_label(restrictions: &[String]) -> &'static str {
    match restrictions {
        [tag] if tag == "Limited" => "Yes",
        [tag] if tag == "LimitedUnique" => "Yes, Unique",
        _ => "No",
    }
}
