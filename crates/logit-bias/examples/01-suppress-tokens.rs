/*
Script that keeps a chat assistant away from a topic by suppressing the tokens
that spell it.

Run with:
```
OPENAI_API_KEY=... cargo run --example 01-suppress-tokens -- 3820 15991
```

Token ids must come from the target model's own tokenizer. Each id passed on
the command line gets a bias of -100.
*/

use anyhow::Result;
use logit_bias::{Chat, Message, RequestSettings, init_tracing, openai_lm};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let api_key = std::env::var("OPENAI_API_KEY")?;
    let lm = openai_lm(api_key, "openai/gpt-4o-mini");

    let mut settings = RequestSettings::builder()
        .model(lm.settings().model.clone())
        .max_tokens(500)
        .temperature(0.7)
        .top_p(0.8)
        .build();
    for arg in std::env::args().skip(1) {
        settings.set_logit_bias(arg.parse()?, -100)?;
    }

    let mut chat = Chat::new(vec![
        Message::system("You are a basketball expert."),
        Message::user("I love the LA Lakers, tell me an interesting fact about LeBron James."),
    ]);

    let response = lm.call_with(chat.clone(), &settings).await?;
    println!("Assistant: {}", response.output.content());
    let mut usage = response.usage;

    chat = response.chat;
    chat.push_message(Message::user("What are some other interesting facts?"));
    let response = lm.call_with(chat, &settings).await?;
    println!("Assistant: {}", response.output.content());
    usage += response.usage;
    println!("Total usage: {usage:?}");

    Ok(())
}
