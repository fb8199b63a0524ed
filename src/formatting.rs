// Formatting - Human-readable numbers for footprint stats and the summary text

/// Group the integer part with thousands separators: 1234567 -> "1,234,567".
pub fn group_thousands(value: f64) -> String {
    let rounded = value.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if negative {
        out.insert(0, '-');
    }
    out
}

/// Kilometre figure used in ring labels: "0.35", "12.4", "1,250".
pub fn km_figure(meters: f64) -> String {
    let km = meters / 1000.0;
    if km < 1.0 {
        format!("{:.2}", km)
    } else if km < 100.0 {
        format!("{:.1}", km)
    } else {
        group_thousands(km)
    }
}

pub fn distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{} m", group_thousands(meters))
    } else {
        format!("{} km", km_figure(meters))
    }
}

pub fn people(count: f64) -> String {
    if count >= 1e9 {
        format!("{:.1} billion", count / 1e9)
    } else if count >= 1e6 {
        format!("{:.1} million", count / 1e6)
    } else {
        group_thousands(count)
    }
}

pub fn usd(amount: f64) -> String {
    if amount >= 1e12 {
        format!("${:.1} trillion", amount / 1e12)
    } else if amount >= 1e9 {
        format!("${:.1} billion", amount / 1e9)
    } else if amount >= 1e6 {
        format!("${:.1} million", amount / 1e6)
    } else {
        format!("${}", group_thousands(amount))
    }
}

pub fn energy_mt(megatons: f64) -> String {
    if megatons < 1.0 {
        format!("{} kilotons TNT", group_thousands(megatons * 1000.0))
    } else {
        format!("{} megatons TNT", group_thousands(megatons))
    }
}

pub fn minutes(total: f64) -> String {
    if total < 1.0 {
        "under 1 min".to_string()
    } else if total < 60.0 {
        format!("{:.0} min", total)
    } else {
        let whole = total.round() as u64;
        format!("{} h {} min", whole / 60, whole % 60)
    }
}
