//! Prompt text sent to the language model.

/// Function the validator snippet must define.
pub const VALIDATOR_FUNCTION: &str = "validateCustomerSchedulingParameters";

/// Parameters of [`VALIDATOR_FUNCTION`], in call order.
pub const VALIDATOR_PARAMETERS: [&str; 7] = [
    "year",
    "month",
    "day",
    "hour",
    "minute",
    "duration_hours",
    "frequency",
];

/// Function the extractor snippet must define. It takes no arguments.
pub const EXTRACTOR_FUNCTION: &str = "getCustomerSchedulingParameters";

/// Keys of the dict returned by [`EXTRACTOR_FUNCTION`], in validator argument order.
pub const EXTRACTOR_KEYS: [&str; 7] = [
    "appointment_year",
    "appointment_month",
    "appointment_date",
    "appointment_time_hour",
    "appointment_time_minute",
    "duration_hours",
    "frequency",
];

pub const VALIDATOR_SYSTEM_PROMPT: &str = r#"Turn the company's booking rules into one Python validation function.

## Instructions
- Use only the "datetime" and "calendar" standard modules.
- Private helper functions are allowed to keep the logic readable.
- Output the function definition only: no import statements, no surrounding code.
- Every argument is given in GMT+8.
- Every argument is optional and may be None. Apply a rule only when the values it needs are present, and check for None before using a value.
- Return a list of strings, one per violated rule. Return an empty list when nothing is violated.
- frequency is one of "Adhoc", "Daily", "Weekly", "Monthly".
- No print statements and no logging.

## Function
Name: `validateCustomerSchedulingParameters`
Arguments:
    - year: int or None
    - month: int or None
    - day: int or None
    - hour: int or None
    - minute: int or None
    - duration_hours: float or None
    - frequency: str or None
Returns: list[str]

## Example

### Input
{ "validationRules": [ "Can't book an appointment less than 48 hours in advance for new clients.", "Appointments can only be booked up to 3 months in advance."] }

### Output
def validateCustomerSchedulingParameters(year=None, month=None, day=None, hour=None, minute=None, duration_hours=None, frequency=None):
    errors = []

    if year is not None and month is not None and day is not None and hour is not None and minute is not None:
        from datetime import datetime, timedelta

        scheduling_time = datetime(year, month, day, hour, minute)
        current_time = datetime.utcnow() + timedelta(hours=8)

        if scheduling_time < current_time + timedelta(hours=48):
            errors.append("Can't book an appointment less than 48 hours in advance for new clients.")

        if scheduling_time > current_time + timedelta(days=90):
            errors.append("Appointments can only be booked up to 3 months in advance.")

    return errors

## Notes
Answer with plain Python code only, no Markdown and no explanation."#;

pub const EXTRACTOR_SYSTEM_PROMPT: &str = r#"Turn a customer's free-text booking request into Python code that returns the scheduling parameters it mentions.

## Instructions
- Use only the "datetime" and "calendar" standard modules.
- Private helper functions are allowed to keep the logic readable.
- Do not write import statements.
- Treat "now" as the current time in GMT+8 and compute relative dates from it.
- Output a single function definition:
  - Name: `getCustomerSchedulingParameters`
  - Arguments: none
  - Returns: a dict with the keys
    - `appointment_date`: day of the month (int or None)
    - `appointment_month`: month of the year (int or None)
    - `appointment_year`: year (int or None)
    - `appointment_time_hour`: hour in 24-hour format (int or None)
    - `appointment_time_minute`: minute of the hour (int or None)
    - `duration_hours`: length of the appointment in hours (float or None)
    - `frequency`: one of "Adhoc", "Daily", "Weekly", "Monthly" (str or None)
- Use None for anything the text does not state. Do not guess.
- No print statements and no logging.

## Example

### Input
"I want to book an appointment for next Monday at 2pm for 2.5 hours."

### Output
def getCustomerSchedulingParameters():
    def _next_monday():
        today = (datetime.datetime.utcnow() + datetime.timedelta(hours=8)).date()
        return today + datetime.timedelta(days=(7 - today.weekday()) % 7)

    monday = _next_monday()
    return {
        "appointment_date": monday.day,
        "appointment_month": monday.month,
        "appointment_year": monday.year,
        "appointment_time_hour": 14,
        "appointment_time_minute": 0,
        "duration_hours": 2.5,
        "frequency": "Adhoc"
    }

## Notes
Answer with plain Python code only, no Markdown and no explanation."#;

/// User message asking for service suggestions.
pub fn services_prompt(max_services: usize) -> String {
    format!(
        "Generate a list up to {} cleaning service names, separated by commas, non-numeric",
        max_services
    )
}

/// User message asking for one service's pricing table.
pub fn pricing_prompt(service: &str) -> String {
    format!("Generate a short demo pricing table for service {}", service)
}
