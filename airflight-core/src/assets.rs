/// Banner image bundled for a destination city, falling back to a generic one.
pub fn destination_image(destination: &str) -> &'static str {
    let key: String = destination
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();

    match key.as_str() {
        "phuket" => "assets/cities/phuket.jpg",
        "bangkok" => "assets/cities/bangkok.jpg",
        "chiangmai" => "assets/cities/chiangmai.jpg",
        "krabi" => "assets/cities/krabi.jpg",
        "hatyai" => "assets/cities/hatyai.jpg",
        _ => "assets/cities/default_flight.jpg",
    }
}
