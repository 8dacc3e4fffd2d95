pub const MCQ_SYSTEM_PROMPT: &str = "You are a helpful AI that is able to generate multiple choice questions and answers. \
The length of each answer should not be more than 15 words. \
Every question has exactly four options and exactly one of them is the correct answer. \
Options must be distinct and must not carry letter labels such as \"A.\" or \"b)\". \
The answer must be copied word for word from one of the options.";

pub const OPEN_ENDED_SYSTEM_PROMPT: &str = "You are a helpful AI that is able to generate a pair of question and answers. \
The length of each answer should not be more than 15 words. \
Answers are short factual statements that can be checked against a reference answer.";

pub const TRANSLATION_PROMPT: &str = "You are a translator. Translate the user's text into the language with code \"{language}\". \
Reply with the translated text only, with no quotes, notes or explanations. \
If the text is already in that language, reply with it unchanged.";

pub fn mcq_user_prompt(topic: &str) -> String {
    format!("You are to generate a random hard multiple choice question about {}", topic)
}

pub fn open_ended_user_prompt(topic: &str) -> String {
    format!("You are to generate a random hard open-ended question about {}", topic)
}
