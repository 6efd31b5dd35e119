use jiff::civil::Time;

/// Accepts `HH:MM`, `HH:MM:SS` and single-digit hours such as `9:05`.
pub fn parse_time(input: &str) -> Result<Time, String> {
    let input = input.trim();

    if let Ok(time) = input.parse::<Time>() {
        return Ok(time);
    }

    if let Ok(time) = format!("0{input}").parse::<Time>() {
        return Ok(time);
    }

    Err(format!("Invalid time of day: {input}"))
}

#[derive(Clone, Debug, PartialEq)]
pub struct CorrectionArg {
    pub package: u32,
    pub address: String,
    pub effective_at: Time,
}

/// `<package>=<address>@<time>`, e.g. `9=410 S State St@10:20`.
pub fn parse_correction(input: &str) -> Result<CorrectionArg, String> {
    let invalid = || format!("Invalid correction {input}, expected <package>=<address>@<time>");

    let (package, rest) = input.split_once('=').ok_or_else(invalid)?;
    let (address, effective_at) = rest.rsplit_once('@').ok_or_else(invalid)?;

    let package = package.trim().parse::<u32>().map_err(|_| invalid())?;
    let address = address.trim();
    if address.is_empty() {
        return Err(invalid());
    }

    Ok(CorrectionArg {
        package,
        address: address.to_owned(),
        effective_at: parse_time(effective_at)?,
    })
}
