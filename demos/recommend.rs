//! Compile the recommendation pipeline written with the typed algebra and
//! print the deployable document.
//!
//! Run with `cargo run --example recommend`.

use morphflow::core::{
    from, join, lift, to_queue, CompilerOptions, Compiler, EventBusRef, Function, FunctionRef,
    QueueRef,
};
use morphflow::utils::serialization::{JsonSerializer, Serializer};

struct Account;
struct User;
struct Category;
struct Product;
struct Mail;

fn function<A, B>(id: &str) -> Function<A, B> {
    Function::new(FunctionRef::new(
        id,
        format!("arn:aws:lambda:eu-west-1:000000000000:function:{}", id),
    ))
}

fn main() -> anyhow::Result<()> {
    let input = EventBusRef::new("input", "arn:aws:events:eu-west-1:000000000000:event-bus/input");
    let reply = QueueRef::new("reply", "https://sqs.eu-west-1.amazonaws.com/000000000000/reply");

    let get_user: Function<Account, User> = function("AtoU");
    let pick_category: Function<User, Vec<Category>> = function("UtoCs");
    let pick_product: Function<Category, Vec<Product>> = function("CtoPs");
    let mail_to: Function<Product, Mail> = function("PtoS");

    let a = from::<Account>(&input, &[]);
    let b = join(&get_user, a);
    let c = join(&pick_category, b);
    let d = lift(&pick_product, c);
    let e = lift(&mail_to, d);
    let pipeline = to_queue(&reply, e);

    let compiler = Compiler::new(CompilerOptions::default().with_dead_letter_queue(reply.clone()));
    let compiled = compiler.compile(&pipeline)?;

    let bytes = JsonSerializer.serialize(&compiled.to_document())?;
    print!("{}", String::from_utf8(bytes)?);
    Ok(())
}
